use super::ui;
use crate::core::record::{TargetType, Vote};
use crate::feedback::{FeedbackService, FeedbackStatus};
use anyhow::Result;

pub fn format_status(status: FeedbackStatus, target_type: TargetType, target_id: &str, vote: Vote) -> String {
    let verb = match status {
        FeedbackStatus::Created => "Recorded",
        FeedbackStatus::Updated => "Updated",
    };
    let thumb = match vote {
        Vote::Up => "👍",
        Vote::Down => "👎",
    };
    format!(
        "{verb} {thumb} for {} {}",
        target_type,
        ui::style_text(target_id, ui::StyleType::Label)
    )
}

pub async fn run(
    service: &FeedbackService,
    user_id: &str,
    target_type: TargetType,
    target_id: &str,
    vote: Vote,
) -> Result<()> {
    let status = service.submit(user_id, target_type, target_id, vote).await?;
    println!("{}", format_status(status, target_type, target_id, vote));
    Ok(())
}
