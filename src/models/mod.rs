pub mod user;
pub mod hackathon;
pub mod team;
pub mod submission;
pub mod notification;

pub use user::{CurrentUser, RoleRef, User};
pub use hackathon::{
    CreateHackathon, CreateRound, CreateSponsorship, Device, Hackathon, Round, Sponsorship,
};
pub use team::{Board, BoardCard, BoardList, CreateTeam, Team, TeamMember};
pub use submission::{CreateJudgeSubmission, CreateSubmission, JudgeSubmission, Submission};
pub use notification::{ChatMessage, ChatRoom, Notification};

/// Backend timestamps come both as RFC 3339 and as offset-less local date-times.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw.as_deref() {
                None | Some("") => Ok(None),
                Some(s) => parse(s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
            }
        }
    }

    /// `2025-03-01 09:30`, or an empty string.
    pub fn display(value: &Option<DateTime<Utc>>) -> String {
        value
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_rfc3339_and_local() {
            let a = parse("2025-03-01T09:30:00Z").unwrap();
            let b = parse("2025-03-01T09:30:00").unwrap();
            let c = parse("2025-03-01T09:30:00.123456").unwrap();
            assert_eq!(a, b);
            assert_eq!(a.timestamp(), c.timestamp());
            assert!(parse("yesterday").is_none());
        }
    }
}
