//! Text Renderer
//!
//! Draws a [`DashboardView`] as plain text: an error banner, four summary
//! cards, the filter line and four chart panels. Panels show a loading
//! placeholder while a load cycle is in flight.

use std::fmt::Write;

use super::derived::{Bar, DashboardView, SeriesPoint, Slice};
use crate::insights::DateRange;

/// Placeholder drawn inside each panel while loading
pub const LOADING: &str = "Loading…";

const BAR_WIDTH: usize = 30;
const LABEL_WIDTH: usize = 16;

/// Render the whole dashboard
pub fn render_dashboard(view: &DashboardView, filter: &DateRange, tenant: Option<&str>) -> String {
    let mut out = String::new();

    match tenant {
        Some(tenant) => {
            let _ = writeln!(out, "Insights Dashboard (tenant {})", tenant);
        }
        None => {
            let _ = writeln!(out, "Insights Dashboard");
        }
    }
    out.push('\n');

    if let Some(error) = &view.error {
        let _ = writeln!(out, "! {}", error);
        out.push('\n');
    }

    let cards: Vec<String> = view
        .cards
        .iter()
        .map(|card| format!("{}: {}", card.title, card.value))
        .collect();
    let _ = writeln!(out, "{}", cards.join(" | "));
    let _ = writeln!(out, "Filter: {}", filter.label());

    panel(&mut out, "Orders by date", view.loading, |out| {
        series_lines(out, &view.series)
    });
    panel(&mut out, "Top 5 customers by spend", view.loading, |out| {
        bar_lines(out, &view.customers)
    });
    panel(&mut out, "Top 5 products (by revenue)", view.loading, |out| {
        bar_lines(out, &view.products)
    });
    panel(&mut out, "New vs Repeat customers", view.loading, |out| {
        pie_lines(out, &view.split)
    });

    out
}

/// Render the login view, with an optional message under the heading
pub fn render_login(message: Option<&str>) -> String {
    let mut out = String::from("Login\n");
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        let _ = writeln!(out, "! {}", message);
    }
    out.push_str("Run `insights login --email <EMAIL> --password <PASSWORD>` to sign in.\n");
    out
}

fn panel<F>(out: &mut String, title: &str, loading: bool, body: F)
where
    F: FnOnce(&mut String),
{
    let _ = writeln!(out, "\n── {} ──", title);
    if loading {
        let _ = writeln!(out, "{}", LOADING);
    } else {
        body(out);
    }
}

fn series_lines(out: &mut String, points: &[SeriesPoint]) {
    let bars: Vec<Bar> = points
        .iter()
        .map(|p| Bar {
            name: p.date.clone(),
            value: p.total,
        })
        .collect();
    bar_lines(out, &bars);
}

fn bar_lines(out: &mut String, bars: &[Bar]) {
    if bars.is_empty() {
        let _ = writeln!(out, "No data");
        return;
    }

    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    for bar in bars {
        let _ = writeln!(
            out,
            "{:<width$} {} {}",
            truncate(&bar.name, LABEL_WIDTH),
            "█".repeat(scaled(bar.value, max)),
            format_value(bar.value),
            width = LABEL_WIDTH
        );
    }
}

fn pie_lines(out: &mut String, slices: &[Slice]) {
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
    for slice in slices {
        let share = if total > 0.0 {
            slice.value.max(0.0) / total * 100.0
        } else {
            0.0
        };
        let _ = writeln!(
            out,
            "{:<8} {:>5.1}%  ({})",
            slice.name,
            share,
            format_value(slice.value)
        );
    }
}

/// Bar length in cells; negative and zero values draw nothing
fn scaled(value: f64, max: f64) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    ((value / max) * BAR_WIDTH as f64).round() as usize
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn truncate(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_string()
    } else {
        let mut short: String = label.chars().take(width - 1).collect();
        short.push('…');
        short
    }
}
