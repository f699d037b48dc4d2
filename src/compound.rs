//! Synthetic compound components for virtualized native widgets.
//!
//! A flat DOM view hides the sub-controls of native widgets: a date input is
//! rendered by the browser as day/month/year spinners, a `<select>` opens a
//! listbox, a video element has play/seek/mute controls, yet none of those
//! parts exist as addressable DOM nodes. The builder attaches small synthetic
//! descriptors to the host element so the model knows what it can actually do
//! there. Components never receive their own interactive index; actions are
//! resolved through the host.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::raw::{DomTree, RawNode};

/// Maximum number of `<option>` texts enumerated on a listbox descriptor.
const MAX_LISTED_OPTIONS: usize = 4;

/// Number of option texts sampled by the format classifier.
const FORMAT_SAMPLE: usize = 10;

/// Upper bound of the year field on date inputs (the HTML date range limit).
const MAX_YEAR: f64 = 275_760.0;

/// Detected shape of a `<select>`'s option values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionFormat {
    Years,
    Months,
    Dates,
    Numbers,
    CountryOrStateCodes,
    Currency,
    FreeText,
}

impl OptionFormat {
    pub fn label(&self) -> &'static str {
        match self {
            OptionFormat::Years => "Years",
            OptionFormat::Months => "Months",
            OptionFormat::Dates => "Dates",
            OptionFormat::Numbers => "Numbers",
            OptionFormat::CountryOrStateCodes => "Country/State codes",
            OptionFormat::Currency => "Currency",
            OptionFormat::FreeText => "Text",
        }
    }
}

/// One synthetic sub-control of a native widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum CompoundComponent {
    /// Numeric field with spinner semantics (date parts, number inputs).
    SpinButton {
        name: String,
        valuemin: f64,
        valuemax: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        valuenow: Option<f64>,
    },
    /// Plain pressable sub-control (dropdown toggle, file chooser, mute).
    Button { name: String },
    /// Free-text sub-field.
    TextBox {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// Continuous range (range inputs, media seek bars).
    Slider {
        name: String,
        valuemin: f64,
        valuemax: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        valuenow: Option<f64>,
    },
    /// Enumerated choice list with a sampled prefix of its options.
    ListBox {
        name: String,
        options: Vec<String>,
        total_options: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        format_hint: Option<OptionFormat>,
    },
}

impl CompoundComponent {
    pub fn name(&self) -> &str {
        match self {
            CompoundComponent::SpinButton { name, .. }
            | CompoundComponent::Button { name }
            | CompoundComponent::TextBox { name, .. }
            | CompoundComponent::Slider { name, .. }
            | CompoundComponent::ListBox { name, .. } => name,
        }
    }

    fn spin(name: &str, min: f64, max: f64) -> Self {
        CompoundComponent::SpinButton {
            name: name.to_string(),
            valuemin: min,
            valuemax: max,
            valuenow: None,
        }
    }
}

static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(19|20)\d{2}$").unwrap());
static RE_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*$").unwrap()
});
static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}[./-]\d{1,2}[./-]\d{2,4}$").unwrap());
static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+([.,]\d+)?$").unwrap());
static RE_REGION_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());
static RE_CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(USD|EUR|GBP|JPY|CHF|CAD|AUD|CNY|INR|SEK|NOK|DKK)$|[$€£¥]").unwrap()
});

fn classify_option(text: &str) -> OptionFormat {
    let t = text.trim();
    if RE_YEAR.is_match(t) {
        OptionFormat::Years
    } else if RE_MONTH.is_match(t) {
        OptionFormat::Months
    } else if RE_DATE.is_match(t) {
        OptionFormat::Dates
    } else if RE_CURRENCY.is_match(t) {
        OptionFormat::Currency
    } else if RE_REGION_CODE.is_match(t) {
        OptionFormat::CountryOrStateCodes
    } else if RE_NUMBER.is_match(t) {
        OptionFormat::Numbers
    } else {
        OptionFormat::FreeText
    }
}

/// Majority vote over a sample of option texts. At least half of the sampled
/// non-blank options must agree on one concrete format for a hint to stick.
fn detect_option_format(options: &[String]) -> Option<OptionFormat> {
    let sample: Vec<&String> = options
        .iter()
        .filter(|o| !o.trim().is_empty())
        .take(FORMAT_SAMPLE)
        .collect();
    if sample.is_empty() {
        return None;
    }

    let mut counts: Vec<(OptionFormat, usize)> = Vec::new();
    for opt in &sample {
        let fmt = classify_option(opt);
        if fmt == OptionFormat::FreeText {
            continue;
        }
        match counts.iter_mut().find(|(f, _)| *f == fmt) {
            Some((_, n)) => *n += 1,
            None => counts.push((fmt, 1)),
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, n)| *n)
        .filter(|(_, n)| *n * 2 >= sample.len())
        .map(|(f, _)| f)
}

fn attr_f64(node: &RawNode, name: &str) -> Option<f64> {
    node.attr(name).and_then(|v| v.trim().parse().ok())
}

fn option_texts(tree: &DomTree, slot: usize) -> Vec<String> {
    let mut out = Vec::new();
    collect_option_texts(tree, slot, &mut out);
    out
}

fn collect_option_texts(tree: &DomTree, slot: usize, out: &mut Vec<String>) {
    let node = tree.get(slot);
    if node.tag == "option" {
        let mut text = String::new();
        for &child in &node.children {
            if let Some(t) = tree.get(child).text() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(t);
            }
        }
        if text.is_empty() {
            if let Some(v) = node.non_empty_attr("value") {
                text = v.to_string();
            }
        }
        out.push(text);
        return;
    }
    for &child in &node.children {
        collect_option_texts(tree, child, out);
    }
}

fn date_parts() -> Vec<CompoundComponent> {
    vec![
        CompoundComponent::spin("Day", 1.0, 31.0),
        CompoundComponent::spin("Month", 1.0, 12.0),
        CompoundComponent::spin("Year", 1.0, MAX_YEAR),
    ]
}

fn time_parts() -> Vec<CompoundComponent> {
    vec![
        CompoundComponent::spin("Hours", 0.0, 23.0),
        CompoundComponent::spin("Minutes", 0.0, 59.0),
    ]
}

fn input_components(tree: &DomTree, slot: usize) -> Vec<CompoundComponent> {
    let node = tree.get(slot);
    let input_type = node.attr("type").unwrap_or("text").to_ascii_lowercase();
    match input_type.as_str() {
        "date" => date_parts(),
        "datetime-local" => {
            let mut parts = date_parts();
            parts.extend(time_parts());
            parts
        }
        "month" => vec![
            CompoundComponent::spin("Month", 1.0, 12.0),
            CompoundComponent::spin("Year", 1.0, MAX_YEAR),
        ],
        "week" => vec![
            CompoundComponent::spin("Week", 1.0, 53.0),
            CompoundComponent::spin("Year", 1.0, MAX_YEAR),
        ],
        "time" => time_parts(),
        "number" => {
            let min = attr_f64(node, "min").unwrap_or(f64::MIN);
            let max = attr_f64(node, "max").unwrap_or(f64::MAX);
            vec![CompoundComponent::SpinButton {
                name: "Value".into(),
                valuemin: min,
                valuemax: max,
                valuenow: attr_f64(node, "value"),
            }]
        }
        "range" => {
            let min = attr_f64(node, "min").unwrap_or(0.0);
            let max = attr_f64(node, "max").unwrap_or(100.0);
            let now = attr_f64(node, "value").unwrap_or((min + max) / 2.0);
            vec![CompoundComponent::Slider {
                name: "Value".into(),
                valuemin: min,
                valuemax: max,
                valuenow: Some(now),
            }]
        }
        "file" => vec![
            CompoundComponent::Button {
                name: "Choose File".into(),
            },
            CompoundComponent::TextBox {
                name: "Selected file".into(),
                value: node.non_empty_attr("value").map(str::to_string),
            },
        ],
        "color" => vec![CompoundComponent::Button {
            name: "Pick Color".into(),
        }],
        _ => Vec::new(),
    }
}

fn select_components(tree: &DomTree, slot: usize) -> Vec<CompoundComponent> {
    let options = option_texts(tree, slot);
    let format_hint = detect_option_format(&options);
    let total_options = options.len();
    let listed: Vec<String> = options.into_iter().take(MAX_LISTED_OPTIONS).collect();
    vec![
        CompoundComponent::Button {
            name: "Open Dropdown".into(),
        },
        CompoundComponent::ListBox {
            name: "Options".into(),
            options: listed,
            total_options,
            format_hint,
        },
    ]
}

fn media_components() -> Vec<CompoundComponent> {
    vec![
        CompoundComponent::Button {
            name: "Play/Pause".into(),
        },
        CompoundComponent::Slider {
            name: "Seek".into(),
            valuemin: 0.0,
            valuemax: 100.0,
            valuenow: None,
        },
        CompoundComponent::Button {
            name: "Mute".into(),
        },
    ]
}

/// Whether this tag/type combination gets synthetic sub-controls at all.
pub fn is_compound_host(node: &RawNode) -> bool {
    match node.tag.as_str() {
        "select" | "video" | "audio" => true,
        "input" => matches!(
            node.attr("type").unwrap_or("text").to_ascii_lowercase().as_str(),
            "date" | "datetime-local" | "month" | "week" | "time" | "number" | "range" | "file"
                | "color"
        ),
        _ => false,
    }
}

/// Build the synthetic components for a host element.
///
/// Returns an empty list for non-hosts and for disabled or `type="hidden"`
/// controls; the caller sets the host's compound flags only when the list is
/// non-empty.
pub fn build_compound_components(tree: &DomTree, slot: usize) -> Vec<CompoundComponent> {
    let node = tree.get(slot);
    if !node.is_element() || !is_compound_host(node) {
        return Vec::new();
    }
    if node.attributes.contains_key("disabled") {
        return Vec::new();
    }
    if node.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("hidden")) {
        return Vec::new();
    }

    match node.tag.as_str() {
        "input" => input_components(tree, slot),
        "select" => select_components(tree, slot),
        "video" | "audio" => media_components(),
        _ => Vec::new(),
    }
}
