//! News sentiment aggregation

use crate::api::alpha_vantage::NewsFeed;
use crate::error::{InvestError, Result};
use serde::{Deserialize, Serialize};

/// Headlines kept in the summary
const TOP_HEADLINES: usize = 5;

/// Aggregated news sentiment for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentMetrics {
    pub symbol: String,
    pub article_count: usize,
    /// Relevance-weighted mean of per-ticker scores, in -1.0..=1.0
    pub average_score: f64,
    pub label: SentimentLabel,
    /// Most relevant headlines first
    pub headlines: Vec<Headline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub source: String,
    pub score: f64,
    pub relevance: f64,
}

/// Alpha Vantage's sentiment buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Bearish,
    #[serde(rename = "Somewhat-Bearish")]
    SomewhatBearish,
    Neutral,
    #[serde(rename = "Somewhat-Bullish")]
    SomewhatBullish,
    Bullish,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score <= -0.35 {
            Self::Bearish
        } else if score <= -0.15 {
            Self::SomewhatBearish
        } else if score < 0.15 {
            Self::Neutral
        } else if score < 0.35 {
            Self::SomewhatBullish
        } else {
            Self::Bullish
        }
    }
}

/// Aggregate the feed's scores for `symbol`
pub fn compute(symbol: &str, feed: &NewsFeed) -> Result<SentimentMetrics> {
    let mut weighted = 0.0;
    let mut weights = 0.0;
    let mut headlines = Vec::new();

    for article in &feed.feed {
        let Some(ticker) = article
            .ticker_sentiment
            .iter()
            .find(|t| t.ticker.eq_ignore_ascii_case(symbol))
        else {
            continue;
        };
        let Some(score) = parse_finite(&ticker.ticker_sentiment_score) else {
            continue;
        };
        let relevance = parse_finite(&ticker.relevance_score)
            .filter(|r| *r > 0.0)
            .unwrap_or(1.0);

        weighted += score * relevance;
        weights += relevance;
        headlines.push(Headline {
            title: article.title.clone(),
            source: article.source.clone(),
            score,
            relevance,
        });
    }

    if headlines.is_empty() {
        return Err(InvestError::unavailable(symbol, "no scored news articles"));
    }

    let article_count = headlines.len();
    let average_score = weighted / weights;
    headlines.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| b.score.abs().total_cmp(&a.score.abs()))
    });
    headlines.truncate(TOP_HEADLINES);

    Ok(SentimentMetrics {
        symbol: symbol.to_string(),
        article_count,
        average_score,
        label: SentimentLabel::from_score(average_score),
        headlines,
    })
}

/// Parse an Alpha Vantage numeric string, rejecting NaN and infinities
fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(title: &str, ticker: &str, relevance: &str, score: &str) -> serde_json::Value {
        json!({
            "title": title,
            "source": "Wire",
            "overall_sentiment_score": 0.1,
            "ticker_sentiment": [{
                "ticker": ticker,
                "relevance_score": relevance,
                "ticker_sentiment_score": score,
                "ticker_sentiment_label": "Neutral"
            }]
        })
    }

    #[test]
    fn test_label_buckets() {
        assert_eq!(SentimentLabel::from_score(-0.5), SentimentLabel::Bearish);
        assert_eq!(SentimentLabel::from_score(-0.2), SentimentLabel::SomewhatBearish);
        assert_eq!(SentimentLabel::from_score(0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(0.15), SentimentLabel::SomewhatBullish);
        assert_eq!(SentimentLabel::from_score(0.35), SentimentLabel::Bullish);
    }

    #[test]
    fn test_relevance_weighted_average() {
        let feed: NewsFeed = serde_json::from_value(json!({
            "feed": [
                article("Beat", "AAPL", "0.75", "0.4"),
                article("Miss", "AAPL", "0.25", "-0.4"),
                article("Other", "MSFT", "1.0", "-0.9"),
            ]
        }))
        .unwrap();

        let metrics = compute("AAPL", &feed).unwrap();
        assert_eq!(metrics.article_count, 2);
        assert!((metrics.average_score - 0.2).abs() < 1e-9);
        assert_eq!(metrics.label, SentimentLabel::SomewhatBullish);
        assert_eq!(metrics.headlines[0].title, "Beat");
    }

    #[test]
    fn test_headlines_are_capped() {
        let articles: Vec<_> = (0..8)
            .map(|i| article(&format!("Story {i}"), "AAPL", "0.5", "0.1"))
            .collect();
        let feed: NewsFeed = serde_json::from_value(json!({ "feed": articles })).unwrap();

        let metrics = compute("AAPL", &feed).unwrap();
        assert_eq!(metrics.article_count, 8);
        assert_eq!(metrics.headlines.len(), TOP_HEADLINES);
    }

    #[test]
    fn test_headlines_ranked_by_relevance() {
        let mut articles: Vec<_> = (0..6)
            .map(|i| article(&format!("Mention {i}"), "AAPL", "0.1", "0.2"))
            .collect();
        articles.push(article("Apple earnings", "AAPL", "0.95", "0.3"));
        articles.push(article("Apple guidance", "AAPL", "0.6", "-0.5"));
        let feed: NewsFeed = serde_json::from_value(json!({ "feed": articles })).unwrap();

        let metrics = compute("AAPL", &feed).unwrap();
        assert_eq!(metrics.headlines.len(), TOP_HEADLINES);
        assert_eq!(metrics.headlines[0].title, "Apple earnings");
        assert_eq!(metrics.headlines[1].title, "Apple guidance");
        assert!((metrics.headlines[0].relevance - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_scores_are_skipped() {
        let feed: NewsFeed = serde_json::from_value(json!({
            "feed": [
                article("Good", "AAPL", "0.5", "0.3"),
                article("Broken", "AAPL", "0.5", "NaN"),
                article("Overflow", "AAPL", "0.5", "inf"),
                article("Weightless", "AAPL", "NaN", "-0.1"),
            ]
        }))
        .unwrap();

        let metrics = compute("AAPL", &feed).unwrap();
        assert_eq!(metrics.article_count, 2);
        assert!(metrics.average_score.is_finite());
        // NaN relevance falls back to 1.0: (0.3 * 0.5 - 0.1) / 1.5
        assert!((metrics.average_score - 0.05 / 1.5).abs() < 1e-9);
        assert!(metrics.headlines.iter().all(|h| h.title != "Broken" && h.title != "Overflow"));

        let feed: NewsFeed =
            serde_json::from_value(json!({ "feed": [article("Broken", "AAPL", "1", "NaN")] }))
                .unwrap();
        assert!(matches!(
            compute("AAPL", &feed),
            Err(InvestError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_no_articles_is_unavailable() {
        let err = compute("AAPL", &NewsFeed::default()).unwrap_err();
        assert!(matches!(err, InvestError::DataUnavailable { .. }));
        assert_eq!(
            serde_json::to_value(SentimentLabel::SomewhatBearish).unwrap(),
            "Somewhat-Bearish"
        );
    }
}
