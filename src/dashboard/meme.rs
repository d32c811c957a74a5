use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meme {
    pub id: String,
    pub url: String,
    pub title: String,
}

const CATALOGUE: &[(&str, &str, &str)] = &[
    (
        "1",
        "/uploads/images/meme1.png",
        "Watching market dump 30% after you shilled #BTC ETF to your entire family last week",
    ),
    ("2", "/uploads/images/meme2.png", "Bitcoin memes 2025"),
    ("3", "/uploads/images/meme3.png", "Hindsight is a beautiful thing…"),
    (
        "4",
        "/uploads/images/meme4.png",
        "Well, Boys, Looks Like It Is Time To Sell",
    ),
    (
        "5",
        "/uploads/images/john-wick-vs-john-weak-crypto-meme.png",
        "John Wick vs John Weak",
    ),
    (
        "6",
        "/uploads/images/my-real-job-meme.png",
        "My real job is not a job",
    ),
    ("7", "/uploads/images/trading-crypto.jpg", "Trading crypto be like"),
];

/// Picks one meme uniformly at random.
pub fn random_meme() -> Meme {
    let (id, url, title) = CATALOGUE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(CATALOGUE[0]);
    Meme {
        id: id.to_string(),
        url: url.to_string(),
        title: title.to_string(),
    }
}
