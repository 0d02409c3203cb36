use std::sync::OnceLock;

use minijinja::{Environment, context};

use crate::entities::pathway::PageResult;
use crate::error::OmicsBrowseError;

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn env() -> Result<&'static Environment<'static>, OmicsBrowseError> {
    if let Some(env) = ENV.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    env.add_filter("dash_if_empty", |s: String| -> String {
        if s.trim().is_empty() {
            "-".to_string()
        } else {
            s
        }
    });
    env.add_template(
        "pathway_page.md.j2",
        include_str!("../../templates/pathway_page.md.j2"),
    )?;

    let _ = ENV.set(env);
    Ok(ENV
        .get()
        .expect("ENV should be initialized by the time this is reached"))
}

/// Page-based footer shown beneath the association table.
///
/// When the caller omitted a page size the backend picked one, so the
/// returned row count stands in for it.
pub fn pagination_footer(
    current: Option<u32>,
    page_size: Option<u32>,
    returned: usize,
    total: u64,
) -> String {
    if returned == 0 {
        return format!("Showing 0 of {total} results.");
    }

    let page = u64::from(current.unwrap_or(1).max(1));
    let size = page_size
        .map(|v| u64::from(v.max(1)))
        .unwrap_or(returned as u64);
    let start = (page - 1) * size + 1;
    let end = start + returned as u64 - 1;
    if end < total {
        format!(
            "Showing {start}-{end} of {total} results. Use --page {} for more.",
            page + 1
        )
    } else if start == end {
        format!("Showing {end} of {total} results.")
    } else {
        format!("Showing {start}-{end} of {total} results.")
    }
}

fn with_pagination_footer(mut body: String, pagination_footer: &str) -> String {
    let footer = pagination_footer.trim();
    if footer.is_empty() || body.contains(footer) {
        return body;
    }
    if !body.ends_with('\n') {
        body.push('\n');
    }
    body.push('\n');
    body.push_str(footer);
    body.push('\n');
    body
}

pub fn pathway_page_markdown(
    page: &PageResult,
    current: Option<u32>,
    page_size: Option<u32>,
) -> Result<String, OmicsBrowseError> {
    let tmpl = env()?.get_template("pathway_page.md.j2")?;
    let footer = pagination_footer(current, page_size, page.data.len(), page.total);
    let body = tmpl.render(context! {
        count => page.data.len(),
        total => page.total,
        rows => &page.data,
        pagination_footer => &footer,
    })?;
    Ok(with_pagination_footer(body, &footer))
}
