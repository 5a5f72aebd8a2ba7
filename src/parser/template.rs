use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::records::TemplateFields;

static START_DATE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".start-date span").unwrap());
static COORDINATES: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".longi span").unwrap());
static REPORT_BUTTON: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".open-report-form").unwrap());
static OTHERS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.others span").unwrap());

// Positions inside `div.others`; index 0 is the group caption.
const TYPE_OF_WORK_IDX: usize = 1;
const FISCAL_YEAR_IDX: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("template has no `{0}`")]
    Missing(&'static str),
}

/// Read the detail fields out of a row's hidden template markup.
pub fn parse_template(html: &str) -> Result<TemplateFields, TemplateError> {
    let fragment = parse_markup(html);

    let start_date = fragment
        .select(&START_DATE)
        .next()
        .map(text_of)
        .ok_or(TemplateError::Missing("start date"))?;

    let long_lat = fragment
        .select(&COORDINATES)
        .next()
        .map(text_of)
        .ok_or(TemplateError::Missing("coordinates"))?;

    let button = fragment
        .select(&REPORT_BUTTON)
        .next()
        .ok_or(TemplateError::Missing("report button"))?;
    let region = button
        .value()
        .attr("data-region")
        .ok_or(TemplateError::Missing("data-region"))?
        .trim()
        .to_string();
    let contract_id = button
        .value()
        .attr("data-contract_id")
        .ok_or(TemplateError::Missing("data-contract_id"))?
        .trim()
        .to_string();

    let others: Vec<String> = fragment.select(&OTHERS).map(text_of).collect();
    let type_of_work = others
        .get(TYPE_OF_WORK_IDX)
        .cloned()
        .ok_or(TemplateError::Missing("type of work"))?;
    let fiscal_year = others
        .get(FISCAL_YEAR_IDX)
        .cloned()
        .ok_or(TemplateError::Missing("fiscal year"))?;

    Ok(TemplateFields {
        start_date,
        long_lat,
        region,
        contract_id,
        type_of_work,
        fiscal_year,
    })
}

/// A `<body>` context drops stray table tags, so row markup is parsed
/// inside a table of its own.
fn parse_markup(html: &str) -> Html {
    let head = html.trim_start().get(..4).unwrap_or_default().to_ascii_lowercase();
    let wrapper = if head.starts_with("<tr") {
        Some(("<table><tbody>", "</tbody></table>"))
    } else if head.starts_with("<td") || head.starts_with("<th") {
        Some(("<table><tbody><tr>", "</tr></tbody></table>"))
    } else {
        None
    };
    match wrapper {
        Some((open, close)) => Html::parse_fragment(&format!("{open}{html}{close}")),
        None => Html::parse_fragment(html),
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
