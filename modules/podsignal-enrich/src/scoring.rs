use chrono::{DateTime, Utc};

use podsignal_common::{CanonicalProfile, FieldKey, ScoreBreakdown, ScoringPolicy};

/// Derives a bounded quality score from a canonical profile. Pure given `as_of`.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    policy: ScoringPolicy,
}

impl QualityScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn score(&self, profile: &CanonicalProfile, as_of: DateTime<Utc>) -> ScoreBreakdown {
        let days_since_last_publish = profile
            .date(FieldKey::LastPublishDate)
            .map(|last| ((as_of - last).num_seconds() as f64 / 86_400.0).max(0.0));
        let avg_publish_interval_days = self.publish_interval(profile);

        let recency = days_since_last_publish.map_or(0.0, |d| self.recency(d));
        let frequency = avg_publish_interval_days.map_or(0.0, |i| self.frequency(i));
        let audience = self.audience(profile);
        let social = self.social(profile);

        let w = &self.policy.weights;
        let composite = ((w.recency * recency
            + w.frequency * frequency
            + w.audience * audience
            + w.social * social)
            * 100.0)
            .clamp(0.0, 100.0);

        ScoreBreakdown {
            recency,
            frequency,
            audience,
            social,
            composite,
            days_since_last_publish,
            avg_publish_interval_days,
        }
    }

    /// Stored interval, else derived from first/last dates once enough episodes exist.
    fn publish_interval(&self, profile: &CanonicalProfile) -> Option<f64> {
        if let Some(interval) = profile.number(FieldKey::AvgPublishIntervalDays) {
            return (interval >= 0.0).then_some(interval);
        }
        let episodes = profile.count(FieldKey::EpisodeCount)?;
        if episodes < self.policy.frequency.min_episodes.max(2) {
            return None;
        }
        let first = profile.date(FieldKey::FirstPublishDate)?;
        let last = profile.date(FieldKey::LastPublishDate)?;
        let span_days = (last - first).num_seconds() as f64 / 86_400.0;
        (span_days >= 0.0).then(|| span_days / (episodes - 1) as f64)
    }

    fn recency(&self, days: f64) -> f64 {
        let b = &self.policy.recency;
        if days <= b.full_days {
            1.0
        } else if days <= b.mid_days {
            lerp(days, b.full_days, 1.0, b.mid_days, b.mid_score)
        } else if days <= b.tail_days {
            lerp(days, b.mid_days, b.mid_score, b.tail_days, b.tail_score)
        } else {
            0.0
        }
    }

    fn frequency(&self, interval: f64) -> f64 {
        let b = &self.policy.frequency;
        let zero_at = b.mid_days * b.tail_multiplier;
        if interval <= b.full_days {
            1.0
        } else if interval <= b.mid_days {
            lerp(interval, b.full_days, 1.0, b.mid_days, b.mid_score)
        } else if interval <= zero_at {
            lerp(interval, b.mid_days, b.mid_score, zero_at, 0.0)
        } else {
            0.0
        }
    }

    fn audience(&self, profile: &CanonicalProfile) -> f64 {
        let p = &self.policy.audience;
        let volume = |rating: FieldKey, count: FieldKey| {
            let rating = profile.number(rating)?;
            let count = profile.number(count)?;
            Some(rating * count)
        };

        p.popularity_weight * ratio(profile.number(FieldKey::PopularityScore), p.high_popularity)
            + p.audience_size_weight
                * ratio(profile.number(FieldKey::AudienceSize), p.high_audience_size)
            + p.apple_weight
                * ratio(
                    volume(FieldKey::AppleRating, FieldKey::AppleRatingCount),
                    p.high_rating_volume,
                )
            + p.spotify_weight
                * ratio(
                    volume(FieldKey::SpotifyRating, FieldKey::SpotifyRatingCount),
                    p.high_rating_volume,
                )
    }

    fn social(&self, profile: &CanonicalProfile) -> f64 {
        let p = &self.policy.social;
        [
            (FieldKey::YoutubeSubscribers, p.youtube_weight),
            (FieldKey::InstagramFollowers, p.instagram_weight),
            (FieldKey::TiktokFollowers, p.tiktok_weight),
            (FieldKey::TwitterFollowers, p.twitter_weight),
            (FieldKey::LinkedinFollowers, p.linkedin_weight),
        ]
        .into_iter()
        .map(|(key, weight)| weight * ratio(profile.number(key), p.high_followers))
        .sum()
    }
}

/// `value / high`, clamped to [0, 1]. Missing or degenerate input is 0.
fn ratio(value: Option<f64>, high: f64) -> f64 {
    match value {
        Some(v) if high > 0.0 && v.is_finite() => (v / high).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Linear interpolation from (x0, y0) to (x1, y1).
fn lerp(x: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    if x1 <= x0 {
        return y1;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}
