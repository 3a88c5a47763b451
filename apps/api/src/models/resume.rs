use serde::{Deserialize, Deserializer, Serialize};

/// The anonymized, structured content of one resume.
///
/// Only professional information survives normalization; `name` is the single
/// personal identifier that is kept. Sequence fields are always present and
/// default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<ProjectEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
}

// Per-entry fields are optional at the type level: a missing `company` or
// `job_title` is a render-time failure, not a decode failure.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub dates: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub dates: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Option<Technologies>,
    #[serde(default)]
    pub dates: Option<String>,
}

/// Project technologies arrive either as one comma-separated string or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Technologies {
    Joined(String),
    List(Vec<String>),
}

impl Technologies {
    /// Normalized technology names, in input order, with blanks dropped.
    ///
    /// A joined string has all whitespace removed before being split on commas,
    /// so `" Python,  Go ,Rust"` and `["Python", "Go", "Rust"]` agree.
    pub fn items(&self) -> Vec<String> {
        match self {
            Technologies::Joined(raw) => {
                let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
                compact
                    .split(',')
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            }
            Technologies::List(items) => items
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// Treats an explicit JSON `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
