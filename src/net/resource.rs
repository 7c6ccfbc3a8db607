//! Backend collections managed from the console.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Subjects,
    Lessons,
    Notes,
    Questions,
    Users,
    Payments,
    Pricing,
    Images,
}

impl Resource {
    pub const ALL: [Self; 8] = [
        Self::Subjects,
        Self::Lessons,
        Self::Notes,
        Self::Questions,
        Self::Users,
        Self::Payments,
        Self::Pricing,
        Self::Images,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subjects => "subjects",
            Self::Lessons => "lessons",
            Self::Notes => "notes",
            Self::Questions => "questions",
            Self::Users => "users",
            Self::Payments => "payments",
            Self::Pricing => "pricing",
            Self::Images => "images",
        }
    }

    /// `/api/<resource>`.
    #[must_use]
    pub fn collection_path(self) -> String {
        format!("/api/{}", self.as_str())
    }

    /// `/api/<resource>/<id>`.
    #[must_use]
    pub fn item_path(self, id: &str) -> String {
        format!("/api/{}/{id}", self.as_str())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource: {0}")]
pub struct UnknownResource(pub String);

impl FromStr for Resource {
    type Err = UnknownResource;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|resource| resource.as_str() == wanted)
            .ok_or_else(|| UnknownResource(raw.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_and_item_paths() {
        assert_eq!(Resource::Subjects.collection_path(), "/api/subjects");
        assert_eq!(Resource::Pricing.item_path("p1"), "/api/pricing/p1");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Lessons".parse::<Resource>(), Ok(Resource::Lessons));
        assert_eq!(" images ".parse::<Resource>(), Ok(Resource::Images));
    }

    #[test]
    fn parse_unknown_fails() {
        assert_eq!("boards".parse::<Resource>(), Err(UnknownResource("boards".into())));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for resource in Resource::ALL {
            assert_eq!(resource.to_string().parse::<Resource>(), Ok(resource));
        }
    }
}
