use crate::models::request::{AnalyzeRequest, PageSignals};
use crate::models::score_report::ScoreWeights;

const NOT_PROVIDED: &str = "Not provided";
const NOT_FOUND: &str = "Not found";

/// Build the audit prompt sent to the completion provider
pub fn build_audit_prompt(
    request: &AnalyzeRequest,
    signals: &PageSignals,
    html: &str,
    weights: &ScoreWeights,
    preview_chars: usize,
) -> String {
    let preview = html_preview(html, preview_chars);
    let website_section = if preview.is_empty() {
        "No website content available".to_string()
    } else {
        format!("Website HTML Preview (first {preview_chars} chars):\n{preview}")
    };

    format!(
        r#"You are a professional brand strategist conducting an online authority audit.

CONTEXT:
- Client Name: {name}
- Website: {website}
- Instagram: {instagram}
- LinkedIn: {linkedin}

WEBSITE ANALYSIS:
- Title: {title}
- Description: {description}
- Has Testimonials: {testimonials}
- Has Case Studies: {case_studies}
- Has About Section: {about}
- Has Contact Info: {contact}
- Content Volume: {words} words

{website_section}

Please analyze their online authority and provide scores:

CLARITY (0-100): How clear is their value proposition, target audience, and offering?
- 80-100: Crystal clear who they help and how
- 60-79: Generally clear but could be more specific
- 40-59: Somewhat vague or generic
- 0-39: Unclear or missing

CREDIBILITY (0-100): What trust signals and social proof exist?
- 80-100: Strong testimonials, case studies, professional design
- 60-79: Some proof elements present
- 40-59: Limited credibility signals
- 0-39: No visible trust factors

VISIBILITY (0-100): How discoverable and active are they online?
- 80-100: Active on multiple platforms with consistent presence
- 60-79: Present on some platforms
- 40-59: Limited online presence
- 0-39: Hard to find online

Calculate overall: (Clarity x {wc:.2}) + (Credibility x {wcr:.2}) + (Visibility x {wv:.2})

Return ONLY valid JSON:
{{
  "clarity": [number],
  "credibility": [number],
  "visibility": [number],
  "overall": [number],
  "interpretation": "[1-2 sentences about their current authority position]",
  "summary": "[2-3 paragraphs analyzing what's working, what's missing, and the biggest opportunity]",
  "actions": [
    "[Specific action to improve clarity]",
    "[Specific action to build credibility]",
    "[Specific action to increase visibility]"
  ]
}}"#,
        name = or_placeholder(request.name(), NOT_PROVIDED),
        website = or_placeholder(request.website(), NOT_PROVIDED),
        instagram = or_placeholder(request.instagram(), NOT_PROVIDED),
        linkedin = or_placeholder(request.linkedin(), NOT_PROVIDED),
        title = or_placeholder(Some(signals.title.as_str()), NOT_FOUND),
        description = or_placeholder(Some(signals.description.as_str()), NOT_FOUND),
        testimonials = signals.has_testimonials,
        case_studies = signals.has_case_studies,
        about = signals.has_about_section,
        contact = signals.has_contact_info,
        words = signals.word_count,
        wc = weights.clarity,
        wcr = weights.credibility,
        wv = weights.visibility,
    )
}

/// First `max_chars` characters of `html`, cut on a char boundary
pub fn html_preview(html: &str, max_chars: usize) -> &str {
    match html.char_indices().nth(max_chars) {
        Some((cut, _)) => &html[..cut],
        None => html,
    }
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(placeholder)
}
