//! Server-side rendering of the single prediction page.

use crate::form::{FormPhase, Outcome, RawInput, DISCLAIMER};
use crate::schema::{self, FieldKind, FieldSpec};

pub const TITLE: &str = "Chronic Kidney Disease Predictor";

const INTRO: &str = "This application helps predict the likelihood of chronic kidney disease \
based on various medical parameters. Please fill in all the fields below with the patient's information.";

const STYLE: &str = "body{font-family:sans-serif;max-width:1200px;margin:0 auto;padding:1rem}\
.grid{display:grid;grid-template-columns:repeat(4,1fr);gap:1rem}\
label{display:block;font-size:.9rem;margin-bottom:.25rem}\
input,select{width:100%;box-sizing:border-box;padding:.4rem}\
.banner{padding:.75rem 1rem;border-radius:.4rem;margin:1rem 0}\
.success{background:#e6f4ea;color:#1e4620}.danger{background:#fdecea;color:#611a15}\
.warning{background:#fff8e1;color:#663c00}";

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_field(spec: &FieldSpec, raw: &str) -> String {
    let control = match spec.kind {
        FieldKind::Numeric { .. } => format!(
            r#"<input type="text" id="{name}" name="{name}" value="{value}">"#,
            name = spec.name,
            value = escape(raw),
        ),
        FieldKind::Categorical { options } => {
            let chosen = raw.trim().to_lowercase();
            let mut select = format!(r#"<select id="{name}" name="{name}"><option value=""></option>"#, name = spec.name);
            for option in options {
                let selected = if *option == chosen { " selected" } else { "" };
                select.push_str(&format!(r#"<option value="{option}"{selected}>{option}</option>"#));
            }
            select.push_str("</select>");
            select
        }
    };
    format!(
        r#"<div class="field"><label for="{}">{}</label>{}</div>"#,
        spec.name,
        escape(spec.label),
        control
    )
}

fn render_form(values: &RawInput, phase: FormPhase) -> String {
    let mut form = format!(r#"<form method="post" action="/" data-phase="{}">"#, phase.as_str());
    for category in schema::categories() {
        form.push_str(&format!(r#"<section><h2>{}</h2><div class="grid">"#, escape(category.name)));
        for spec in category.fields {
            form.push_str(&render_field(spec, values.get(spec.name)));
        }
        form.push_str("</div></section>");
    }
    form.push_str(r#"<p><button type="submit">Predict</button></p></form>"#);
    form
}

fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Invalid(errors) => {
            let mut list = String::from(r#"<ul class="banner danger errors">"#);
            for error in errors {
                list.push_str(&format!(
                    r#"<li data-field="{}">{}</li>"#,
                    error.field(),
                    escape(&error.to_string())
                ));
            }
            list.push_str("</ul>");
            list
        }
        Outcome::Predicted(diagnosis) => {
            let (class, icon) = match diagnosis {
                crate::classifier::Diagnosis::NotLikely => ("success", "🟢"),
                crate::classifier::Diagnosis::Likely => ("danger", "🔴"),
            };
            format!(
                r#"<div class="banner {class} result">{icon} {}</div><div class="banner warning disclaimer">⚠️ {}</div>"#,
                escape(diagnosis.message()),
                escape(DISCLAIMER),
            )
        }
        Outcome::PredictionFailed(message) => {
            format!(r#"<div class="banner danger">{}</div>"#, escape(message))
        }
        Outcome::ModelUnavailable(message) => render_model_unavailable(message),
    }
}

fn render_model_unavailable(message: &str) -> String {
    format!(
        r#"<div class="banner danger model-unavailable">{}. Prediction is disabled until the model file is available.</div>"#,
        escape(message)
    )
}

/// Renders the full page.
///
/// `values` repopulates the form after a submission. `model_error` is shown
/// as a banner above the form unless the outcome already reports it.
pub fn render(values: &RawInput, outcome: Option<&Outcome>, model_error: Option<&str>) -> String {
    let mut body = format!("<h1>🏥 {}</h1><p>{}</p>", TITLE, escape(INTRO));

    let reported = matches!(outcome, Some(Outcome::ModelUnavailable(_)));
    if let (Some(message), false) = (model_error, reported) {
        body.push_str(&render_model_unavailable(message));
    }

    let phase = outcome.map_or(FormPhase::Collecting, Outcome::phase);
    body.push_str(&render_form(values, phase));

    if let Some(outcome) = outcome {
        body.push_str(&render_outcome(outcome));
    }

    format!(
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>{TITLE}</title><style>{STYLE}</style></head><body>{body}</body></html>"#
    )
}
