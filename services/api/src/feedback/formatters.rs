use opine_db::feedback::models::{FeedbackRecord, FeedbackType};

const POSITIVE_TAGS: [&str; 2] = ["excellent", "good"];

/// Tags that count as positive sentiment suppress ticket creation.
pub fn is_positive_tag(tag: &str) -> bool {
    let tag = tag.trim();
    POSITIVE_TAGS.iter().any(|p| tag.eq_ignore_ascii_case(p))
}

/// Replacement summary used when the submitted one is over the length limit.
pub fn synthesized_summary(
    feedback_type: FeedbackType,
    created_by: &str,
    entity_title: &str,
) -> String {
    format!(
        "{} reported by {} for {}",
        feedback_type.label(),
        created_by,
        entity_title
    )
}

pub fn ticket_description(record: &FeedbackRecord) -> String {
    let mut description = record.description.clone();
    if !description.is_empty() {
        description.push_str("\n\n");
    }
    description.push_str(&format!("Submitted by {}", record.created_by));
    if !record.url.is_empty() {
        description.push_str(&format!("\nSubmitted from {}", record.url));
    }
    description
}

pub fn mail_subject(record: &FeedbackRecord, entity_title: &str) -> String {
    format!(
        "[{}] New {} for {}",
        record.tag,
        record.feedback_type.label(),
        entity_title
    )
}

pub fn mail_body(record: &FeedbackRecord, entity_title: &str, app_title: &str) -> String {
    let mut body = format!(
        "A new {} was submitted for {} in {}.\n\nSummary: {}\n",
        record.feedback_type.label().to_lowercase(),
        entity_title,
        app_title,
        record.summary
    );
    if !record.description.is_empty() {
        body.push_str(&format!("\n{}\n", record.description));
    }
    body.push_str(&format!("\nSubmitted by {}", record.created_by));
    if !record.url.is_empty() {
        body.push_str(&format!("\nSubmitted from {}", record.url));
    }
    body
}
