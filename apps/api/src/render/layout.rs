//! Layout: maps a `ResumeRecord` onto an ordered list of document blocks.
//!
//! Section order is fixed: Name, Summary, Technical Skills, Professional
//! History, Education, Projects, Achievements. Empty sections are skipped;
//! the relative order of the rest never changes.

use crate::errors::PipelineError;
use crate::models::resume::{EducationEntry, ExperienceEntry, ProjectEntry, ResumeRecord};

pub const NAME_SIZE_PT: usize = 20;
pub const HEADING_SIZE_PT: usize = 16;
pub const ENTRY_TITLE_SIZE_PT: usize = 12;

pub const SUMMARY_HEADING: &str = "Professional Summary";
pub const SKILLS_HEADING: &str = "Technical Skills";
pub const EXPERIENCE_HEADING: &str = "Professional History";
pub const EDUCATION_HEADING: &str = "Education";
pub const PROJECTS_HEADING: &str = "Projects";
pub const ACHIEVEMENTS_HEADING: &str = "Achievements";

/// Lines starting with one of these are already bulleted and must not get a second bullet.
const BULLET_GLYPHS: &[char] = &['•', '●', '▪', '◦', '‣'];

/// A styled run of text inside a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub size_pt: Option<usize>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            size_pt: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            italic: true,
            ..Self::plain(text)
        }
    }

    pub fn sized(self, size_pt: usize) -> Self {
        Self {
            size_pt: Some(size_pt),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Centered, bold, large name line.
    Title(String),
    /// Bold section heading.
    Heading(String),
    /// Full-width underscore rule under a heading.
    Rule,
    Paragraph(Vec<Span>),
    Bullet(String),
    Spacer,
}

pub fn layout(record: &ResumeRecord) -> Result<Vec<Block>, PipelineError> {
    let mut blocks = vec![
        Block::Title(record.name.trim().to_string()),
        Block::Spacer,
        Block::Spacer,
    ];

    if let Some(summary) = record.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        section(&mut blocks, SUMMARY_HEADING);
        blocks.push(Block::Paragraph(vec![Span::plain(summary)]));
        blocks.push(Block::Spacer);
    }

    let skills = non_blank(&record.skills);
    if !skills.is_empty() {
        section(&mut blocks, SKILLS_HEADING);
        blocks.push(Block::Paragraph(vec![Span::plain(skills.join(", "))]));
        blocks.push(Block::Spacer);
    }

    if !record.experience.is_empty() {
        section(&mut blocks, EXPERIENCE_HEADING);
        for (index, entry) in record.experience.iter().enumerate() {
            experience_entry(&mut blocks, index, entry)?;
        }
    }

    if !record.education.is_empty() {
        section(&mut blocks, EDUCATION_HEADING);
        for (index, entry) in record.education.iter().enumerate() {
            education_entry(&mut blocks, index, entry)?;
        }
    }

    if !record.projects.is_empty() {
        section(&mut blocks, PROJECTS_HEADING);
        for (index, entry) in record.projects.iter().enumerate() {
            project_entry(&mut blocks, index, entry)?;
        }
    }

    let achievements = non_blank(&record.achievements);
    if !achievements.is_empty() {
        section(&mut blocks, ACHIEVEMENTS_HEADING);
        blocks.extend(achievements.into_iter().map(|a| Block::Bullet(a.to_string())));
        blocks.push(Block::Spacer);
    }

    Ok(blocks)
}

fn section(blocks: &mut Vec<Block>, heading: &str) {
    blocks.push(Block::Heading(heading.to_string()));
    blocks.push(Block::Rule);
}

fn experience_entry(
    blocks: &mut Vec<Block>,
    index: usize,
    entry: &ExperienceEntry,
) -> Result<(), PipelineError> {
    let company = required(&entry.company, "experience", index, "company")?;
    let job_title = required(&entry.job_title, "experience", index, "job_title")?;

    blocks.push(Block::Paragraph(vec![Span::bold(company).sized(ENTRY_TITLE_SIZE_PT)]));
    blocks.push(Block::Paragraph(with_dates(
        Span::italic(job_title),
        entry.dates.as_deref(),
    )));
    blocks.extend(description_lines(entry.description.as_deref()).map(Block::Bullet));
    blocks.push(Block::Spacer);
    Ok(())
}

fn education_entry(
    blocks: &mut Vec<Block>,
    index: usize,
    entry: &EducationEntry,
) -> Result<(), PipelineError> {
    let school = required(&entry.school, "education", index, "school")?;
    let degree = required(&entry.degree, "education", index, "degree")?;

    blocks.push(Block::Paragraph(vec![Span::bold(school).sized(ENTRY_TITLE_SIZE_PT)]));
    blocks.push(Block::Paragraph(with_dates(
        Span::italic(degree),
        entry.dates.as_deref(),
    )));
    blocks.extend(description_lines(entry.description.as_deref()).map(Block::Bullet));
    blocks.push(Block::Spacer);
    Ok(())
}

fn project_entry(
    blocks: &mut Vec<Block>,
    index: usize,
    entry: &ProjectEntry,
) -> Result<(), PipelineError> {
    let title = required(&entry.title, "projects", index, "title")?;

    blocks.push(Block::Paragraph(with_dates(
        Span::bold(title).sized(ENTRY_TITLE_SIZE_PT),
        entry.dates.as_deref(),
    )));

    let technologies = entry
        .technologies
        .as_ref()
        .map(|t| t.items())
        .unwrap_or_default();
    if !technologies.is_empty() {
        blocks.push(Block::Paragraph(vec![
            Span::bold("Technologies: "),
            Span::plain(technologies.join(", ")),
        ]));
    }

    for line in description_lines(entry.description.as_deref()) {
        if line.starts_with(BULLET_GLYPHS) {
            blocks.push(Block::Paragraph(vec![Span::plain(line)]));
        } else {
            blocks.push(Block::Bullet(line));
        }
    }
    blocks.push(Block::Spacer);
    Ok(())
}

/// A present, non-blank value for a field the layout cannot do without.
fn required<'a>(
    value: &'a Option<String>,
    section: &str,
    index: usize,
    field: &str,
) -> Result<&'a str, PipelineError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            PipelineError::Render(format!(
                "{section} entry {} is missing required field `{field}`",
                index + 1
            ))
        })
}

fn with_dates(lead: Span, dates: Option<&str>) -> Vec<Span> {
    let mut spans = vec![lead];
    if let Some(dates) = dates.map(str::trim).filter(|d| !d.is_empty()) {
        spans.push(Span::plain(format!(" ({dates})")));
    }
    spans
}

/// Trimmed, non-blank lines of a multi-line description.
fn description_lines(description: Option<&str>) -> impl Iterator<Item = String> + '_ {
    description
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
}

fn non_blank(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}
