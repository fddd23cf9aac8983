// Plain-text rendering of catalog state for the terminal
use std::fmt::Write;

use tenderscout_core::{CatalogState, Pagination, Tender};

const NO_DEADLINE: &str = "No deadline";

pub fn deadline(tender: &Tender) -> String {
    match (tender.deadline_at(), tender.deadline.as_deref()) {
        (Some(at), _) => at.format("%d %b %Y").to_string(),
        (None, Some(raw)) if !raw.is_empty() => raw.to_string(),
        _ => NO_DEADLINE.to_string(),
    }
}

pub fn budget(tender: &Tender) -> String {
    let Some(raw) = &tender.budget else {
        return "Not disclosed".to_string();
    };
    let currency = tender.currency.as_deref().unwrap_or("USD");
    match raw.amount() {
        Some(amount) => format!("{} {}", currency, group_thousands(amount)),
        None => format!("{} {}", currency, raw),
    }
}

/// `1234567.8` -> `1,234,568`
fn group_thousands(amount: f64) -> String {
    let whole = amount.round().abs() as u64;
    let digits = whole.to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// One line per tender in a listing
pub fn tender_line(tender: &Tender) -> String {
    let status = tender
        .status
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<26} {:<8} {} | {} | {} | due {}",
        tender.id,
        status,
        tender.title,
        tender.organization,
        tender.country,
        deadline(tender)
    )
}

pub fn pagination_footer(p: &Pagination) -> String {
    format!(
        "Page {} of {} ({} tenders, {} per page)",
        p.page, p.pages, p.total, p.limit
    )
}

pub fn listing(state: &CatalogState) -> String {
    let mut out = String::new();
    if state.listing().is_empty() {
        out.push_str("No tenders match the current filters.\n");
    }
    for tender in state.listing() {
        let _ = writeln!(out, "{}", tender_line(tender));
    }
    let _ = writeln!(out, "{}", pagination_footer(state.pagination()));
    out
}

pub fn detail(tender: &Tender) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", tender.title);
    let _ = writeln!(out, "{}", "=".repeat(tender.title.chars().count().max(1)));
    let _ = writeln!(out, "Organization: {}", tender.organization);
    let _ = writeln!(out, "Country:      {}", tender.country);
    let _ = writeln!(out, "Category:     {}", tender.category);
    if let Some(status) = &tender.status {
        let _ = writeln!(out, "Status:       {}", status);
    }
    let _ = writeln!(out, "Budget:       {}", budget(tender));
    let _ = writeln!(out, "Deadline:     {}", deadline(tender));

    if !tender.description.is_empty() {
        let _ = writeln!(out, "\n{}", tender.description);
    }

    if let Some(requirements) = tender.requirements.as_ref().filter(|r| !r.is_empty()) {
        let _ = writeln!(out, "\nRequirements:");
        for requirement in requirements {
            let _ = writeln!(out, "  - {}", requirement);
        }
    }

    let contacts: Vec<_> = [
        ("Email", &tender.contact_email),
        ("Phone", &tender.contact_phone),
        ("Website", &tender.website),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| (label, v))
    })
    .collect();

    if !contacts.is_empty() {
        let _ = writeln!(out, "\nContact:");
        for (label, value) in contacts {
            let _ = writeln!(out, "  {}: {}", label, value);
        }
    }

    out
}
