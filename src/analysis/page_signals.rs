use crate::models::request::PageSignals;
use regex::Regex;
use std::sync::OnceLock;

struct SignalPatterns {
    title: Regex,
    description: Regex,
    testimonials: Regex,
    case_studies: Regex,
    about_section: Regex,
    contact_info: Regex,
    tag: Regex,
}

fn patterns() -> &'static SignalPatterns {
    static PATTERNS: OnceLock<SignalPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| SignalPatterns {
        title: compile(r"(?i)<title[^>]*>([^<]+)</title>"),
        description: compile(
            r#"(?i)<meta\s+name=["']description["']\s+content=["']([^"']+)["']"#,
        ),
        testimonials: compile(r#"(?i)testimonial|review|feedback|"what.*say""#),
        case_studies: compile(
            r"(?i)case\s+stud|portfolio|work\s+with|success\s+stor|client.*result",
        ),
        about_section: compile(
            r#"(?i)<(?:section|div)[^>]*(?:id|class)=["'][^"']*about[^"']*["']"#,
        ),
        contact_info: compile(r"(?i)contact|email|phone|get\s+in\s+touch"),
        tag: compile(r"<[^>]*>"),
    })
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid signal pattern {pattern}: {e}"))
}

/// Extract the trust and positioning signals the audit prompt summarizes
pub fn extract_signals(html: &str) -> PageSignals {
    if html.trim().is_empty() {
        return PageSignals::default();
    }

    let p = patterns();
    PageSignals {
        title: first_capture(&p.title, html),
        description: first_capture(&p.description, html),
        has_testimonials: p.testimonials.is_match(html),
        has_case_studies: p.case_studies.is_match(html),
        has_about_section: p.about_section.is_match(html),
        has_contact_info: p.contact_info.is_match(html),
        word_count: p.tag.replace_all(html, " ").split_whitespace().count(),
    }
}

fn first_capture(pattern: &Regex, html: &str) -> String {
    pattern
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
