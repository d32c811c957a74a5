use super::ui;
use crate::core::preferences::{Section, UserPreferences};
use crate::dashboard::insight::Insight;
use crate::dashboard::news::NewsItem;
use crate::dashboard::prices::PriceItem;
use crate::dashboard::{Dashboard, DashboardPayload};
use anyhow::Result;
use comfy_table::Cell;

pub fn render_prices(prices: &[PriceItem]) -> String {
    if prices.is_empty() {
        return ui::style_text("No prices available right now.", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Coin"),
        ui::header_cell("Price (USD)"),
        ui::header_cell("24h"),
        ui::header_cell("Market Cap"),
    ]);
    for price in prices {
        table.add_row(vec![
            Cell::new(&price.name),
            ui::usd_cell(price.price),
            ui::change_cell(price.change24h),
            ui::usd_cell(price.market_cap),
        ]);
    }
    table.to_string()
}

pub fn render_news(news: &[NewsItem]) -> String {
    if news.is_empty() {
        return ui::style_text("No news available right now.", ui::StyleType::Subtle);
    }

    let mut output = String::new();
    for (i, item) in news.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!(
            "{} {}\n",
            ui::style_text(&format!("{}.", i + 1), ui::StyleType::Label),
            ui::style_text(&item.title, ui::StyleType::Label)
        ));
        if item.summary != item.title {
            output.push_str(&format!("   {}\n", item.summary));
        }
        let mut meta = format!("{} · {}", item.source, item.published_at.format("%Y-%m-%d %H:%M"));
        if !item.tags.is_empty() {
            meta.push_str(&format!(" · {}", item.tags.join(", ")));
        }
        output.push_str(&format!("   {}\n", ui::style_text(&meta, ui::StyleType::Subtle)));
        output.push_str(&format!("   {}\n", item.url));
    }
    output
}

pub fn render_insight(insight: &Insight) -> String {
    format!(
        "{}\n{}",
        insight.text,
        ui::style_text(
            &format!("Generated {}", insight.generated_at.format("%Y-%m-%d %H:%M UTC")),
            ui::StyleType::Subtle
        )
    )
}

/// Renders the sections enabled by the payload's content types.
pub fn render_dashboard(payload: &DashboardPayload) -> String {
    let prefs = UserPreferences {
        assets: payload.preferences.assets.clone(),
        investor_type: None,
        content_types: payload.preferences.content_types.clone(),
    };

    let mut sections = Vec::new();
    if prefs.shows(Section::News) {
        sections.push(("Market News", render_news(&payload.news)));
    }
    if prefs.shows(Section::Prices) {
        sections.push(("Coin Prices", render_prices(&payload.prices)));
    }
    if prefs.shows(Section::Insight) {
        sections.push(("AI Insight", render_insight(&payload.insight)));
    }
    if prefs.shows(Section::Meme) {
        sections.push((
            "Meme of the Day",
            format!("{}\n{}", payload.meme.title, payload.meme.url),
        ));
    }

    let mut output = String::new();
    for (title, body) in sections {
        output.push_str(&format!(
            "{}\n\n{}\n\n",
            ui::style_text(title, ui::StyleType::Title),
            body.trim_end()
        ));
    }
    output.push_str(&ui::style_text(
        &format!("Updated {}", payload.updated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        ui::StyleType::Subtle,
    ));
    output
}

pub async fn run(dashboard: &Dashboard, prefs: &UserPreferences, json: bool) -> Result<()> {
    let spinner = ui::new_spinner("Loading dashboard...");
    let result = dashboard.fetch(prefs).await;
    spinner.finish_and_clear();
    let payload = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", render_dashboard(&payload));
    }
    Ok(())
}

pub async fn run_prices(dashboard: &Dashboard, assets: &[String]) -> Result<()> {
    let spinner = ui::new_spinner("Fetching prices...");
    let result = dashboard.prices(assets).await;
    spinner.finish_and_clear();
    println!("{}", render_prices(&result?));
    Ok(())
}

pub async fn run_news(dashboard: &Dashboard) -> Result<()> {
    let spinner = ui::new_spinner("Fetching news...");
    let result = dashboard.news().await;
    spinner.finish_and_clear();
    print!("{}", render_news(&result?));
    Ok(())
}

pub async fn run_insight(dashboard: &Dashboard, prefs: &UserPreferences) -> Result<()> {
    let spinner = ui::new_spinner("Generating insight...");
    let insight = dashboard.insight(prefs).await;
    spinner.finish_and_clear();
    println!("{}", render_insight(&insight));
    Ok(())
}
