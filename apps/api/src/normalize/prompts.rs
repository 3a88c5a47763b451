// Anonymization contract sent with every resume.

pub const ANONYMIZE_SYSTEM: &str = "\
You are a professional resume parser and anonymizer. \
Your job is to extract only professional information from resumes and strictly \
remove ALL personal information EXCEPT for the person's name. \
Never include phone numbers, email addresses, home or postal addresses, \
LinkedIn URLs, personal websites, or social media profiles.";

pub const ANONYMIZE_PROMPT: &str = r#"Given this resume text:

"""
{resume_text}
"""

1. Parse it and output a single JSON object with exactly these keys:
{
  "name": "string",
  "summary": "string" | null,
  "skills": ["string"],
  "experience": [{"job_title": "string", "company": "string", "dates": "string", "description": "string"}],
  "education": [{"degree": "string", "school": "string", "dates": "string", "description": "string"}],
  "projects": [{"title": "string", "description": "string", "technologies": ["string"], "dates": "string"}],
  "achievements": ["string"]
}

2. Use an empty array for any section the resume does not contain.
3. Put each responsibility or accomplishment of a description on its own line, separated by "\n".
4. Do not include any phone number, email, address, links, or personal identifiers other than the name.
5. Make sure your JSON is clean and does not contain any keys with personal information.

Return ONLY the JSON object. No prose, no code fences."#;
