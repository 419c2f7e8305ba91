//! Field extraction from ILL DOI landing pages
//!
//! The landing pages have no machine-readable metadata. Every field is
//! anchored on a heading whose text contains a known label: an
//! `h4.details-name` for detail blocks, an `h3` for the parameter sections.
//! A missing anchor fails that field, and [`extract_document`] fails the
//! whole document on the first failed field.

use std::fmt;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use serde_json::{Map, Value};

static DETAILS_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4.details-name").expect("invalid selector"));
static SECTION_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("invalid selector"));
static BUTTON_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.btn-info").expect("invalid selector"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("invalid selector"));
static LIST_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("invalid selector"));
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4").expect("invalid selector"));
static BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("invalid selector"));

/// Parameter name to value, in page order
pub type ParameterMap = Map<String, Value>;

/// Why a field could not be extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No heading carries the label
    MissingLabel(&'static str),
    /// No `a.btn-info` button with this text
    MissingButton(&'static str),
    /// Expected element absent inside a field's container
    MissingElement {
        field: &'static str,
        element: &'static str,
    },
    /// Link without `href`
    MissingHref(&'static str),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLabel(label) => write!(f, "no \"{label}\" heading"),
            Self::MissingButton(text) => write!(f, "no \"{text}\" button"),
            Self::MissingElement { field, element } => {
                write!(f, "{field}: missing <{element}>")
            }
            Self::MissingHref(field) => write!(f, "{field}: link without href"),
        }
    }
}

impl std::error::Error for ExtractError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instrument {
    pub name: String,
    pub url: String,
}

/// Author identifier link (ORCID and the like)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorId {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    /// Only present when the author entry has links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<AuthorId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub authors: Vec<Author>,
    pub publication_year: String,
    pub cycles: Vec<String>,
    pub experimental_parameters: ParameterMap,
    pub sample_parameters: ParameterMap,
}

/// Everything taken from one landing page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IllDocument {
    pub document_doi_url: String,
    pub experimental_report_url: String,
    pub data_url: String,
    pub proposal_number: String,
    pub proposal_id: String,
    pub instruments: Vec<Instrument>,
    pub metadata: DocumentMetadata,
}

/// One method per landing page field
pub trait DocumentFieldExtractor {
    /// Absolute URL of the "Download Data" button (required)
    fn data_url(&self) -> Result<String, ExtractError>;
    /// Absolute URL of the "Experimental Report" button, empty if absent
    fn experimental_report_url(&self) -> Result<String, ExtractError>;
    fn proposal_number(&self) -> Result<String, ExtractError>;
    fn instruments(&self) -> Result<Vec<Instrument>, ExtractError>;
    fn authors(&self) -> Result<Vec<Author>, ExtractError>;
    fn publication_year(&self) -> Result<String, ExtractError>;
    fn cycles(&self) -> Result<Vec<String>, ExtractError>;
    fn experimental_parameters(&self) -> Result<ParameterMap, ExtractError>;
    fn sample_parameters(&self) -> Result<ParameterMap, ExtractError>;
}

/// Assemble a document from `extractor`; the first failed field fails it.
pub fn extract_document<E>(document_doi_url: &str, extractor: &E) -> Result<IllDocument, ExtractError>
where
    E: DocumentFieldExtractor + ?Sized,
{
    let data_url = extractor.data_url()?;
    let proposal_id = proposal_id(&data_url).to_string();
    Ok(IllDocument {
        document_doi_url: document_doi_url.to_string(),
        experimental_report_url: extractor.experimental_report_url()?,
        proposal_number: extractor.proposal_number()?,
        proposal_id,
        instruments: extractor.instruments()?,
        metadata: DocumentMetadata {
            authors: extractor.authors()?,
            publication_year: extractor.publication_year()?,
            cycles: extractor.cycles()?,
            experimental_parameters: extractor.experimental_parameters()?,
            sample_parameters: extractor.sample_parameters()?,
        },
        data_url,
    })
}

/// Value of the last query parameter of the data URL
pub fn proposal_id(data_url: &str) -> &str {
    let last = data_url.rsplit('&').next().unwrap_or(data_url);
    last.rsplit('=').next().unwrap_or(last)
}

/// Drop newlines, trim, and squeeze runs of spaces to one
pub fn collapse_whitespace(text: &str) -> String {
    text.replace('\n', "")
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scraper-backed extractor over one parsed landing page
pub struct HtmlExtractor {
    html: Html,
    base_url: String,
}

impl HtmlExtractor {
    /// `base_url` is the DOI resolver root the page's relative links hang off
    pub fn parse(page: &str, base_url: &str) -> Self {
        Self {
            html: Html::parse_document(page),
            base_url: base_url.to_string(),
        }
    }

    /// `h4.details-name` containing `label`, and its parent container
    fn detail(&self, label: &'static str) -> Result<(ElementRef<'_>, ElementRef<'_>), ExtractError> {
        let heading = self
            .html
            .select(&DETAILS_NAME)
            .find(|h| text_of(*h).contains(label))
            .ok_or(ExtractError::MissingLabel(label))?;
        let container = parent_element(heading).ok_or(ExtractError::MissingLabel(label))?;
        Ok((heading, container))
    }

    /// Grandparent of the `h3` containing `title`
    fn section(&self, title: &'static str) -> Result<ElementRef<'_>, ExtractError> {
        self.html
            .select(&SECTION_TITLE)
            .find(|h| text_of(*h).contains(title))
            .and_then(parent_element)
            .and_then(parent_element)
            .ok_or(ExtractError::MissingLabel(title))
    }

    fn button_href(&self, text: &'static str) -> Result<Option<&str>, ExtractError> {
        match self
            .html
            .select(&BUTTON_LINK)
            .find(|a| text_of(*a).contains(text))
        {
            Some(a) => a
                .value()
                .attr("href")
                .map(Some)
                .ok_or(ExtractError::MissingHref(text)),
            None => Ok(None),
        }
    }
}

impl DocumentFieldExtractor for HtmlExtractor {
    fn data_url(&self) -> Result<String, ExtractError> {
        let href = self
            .button_href("Download Data")?
            .ok_or(ExtractError::MissingButton("Download Data"))?;
        Ok(format!("{}{href}", self.base_url))
    }

    fn experimental_report_url(&self) -> Result<String, ExtractError> {
        Ok(self
            .button_href("Experimental Report")?
            .map(|href| format!("{}{href}", self.base_url.trim_end_matches('/')))
            .unwrap_or_default())
    }

    fn proposal_number(&self) -> Result<String, ExtractError> {
        let (heading, container) = self.detail("Proposal number")?;
        Ok(text_excluding(container, heading).trim().to_string())
    }

    fn instruments(&self) -> Result<Vec<Instrument>, ExtractError> {
        let (_, container) = self.detail("Instruments")?;
        container
            .select(&LINK)
            .map(|a| {
                let url = a
                    .value()
                    .attr("href")
                    .ok_or(ExtractError::MissingHref("instruments"))?;
                Ok(Instrument {
                    name: collapse_whitespace(&text_of(a)),
                    url: url.to_string(),
                })
            })
            .collect()
    }

    fn authors(&self) -> Result<Vec<Author>, ExtractError> {
        let (_, container) = self.detail("Authors")?;
        container.select(&LIST_ITEM).map(author).collect()
    }

    fn publication_year(&self) -> Result<String, ExtractError> {
        let (_, container) = self.detail("Publication year")?;
        let text = text_of(container);
        let text = text.trim();
        Ok(text.rsplit(' ').next().unwrap_or(text).to_string())
    }

    fn cycles(&self) -> Result<Vec<String>, ExtractError> {
        let (_, container) = self.detail("Cycles")?;
        let first = container
            .select(&LIST_ITEM)
            .next()
            .ok_or(ExtractError::MissingElement {
                field: "cycles",
                element: "li",
            })?;
        // Each child node (text or element) of the first item is one cycle
        Ok(first
            .children()
            .map(|child| match ElementRef::wrap(child) {
                Some(el) => text_of(el),
                None => child
                    .value()
                    .as_text()
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
            })
            .map(|text| collapse_whitespace(&text).replace(" )", ")"))
            .filter(|cycle| !cycle.is_empty())
            .collect())
    }

    fn experimental_parameters(&self) -> Result<ParameterMap, ExtractError> {
        let section = self.section("Experiment Parameters")?;
        let mut params = ParameterMap::new();
        for item in section.select(&LIST_ITEM) {
            let name = first_text(item, &HEADING, "experimentalParameters", "h4")?;
            let value = first_text(item, &BLOCK, "experimentalParameters", "div")?;
            let value = value.trim();
            let value = value.rsplit(' ').next().unwrap_or(value);
            params.insert(name.trim().to_string(), Value::String(value.to_string()));
        }
        Ok(params)
    }

    fn sample_parameters(&self) -> Result<ParameterMap, ExtractError> {
        let section = self.section("Sample Parameters")?;
        let mut params = ParameterMap::new();
        for item in section.select(&LIST_ITEM) {
            let Some(heading) = item.select(&HEADING).next() else {
                continue;
            };
            let value = match item.select(&LIST_ITEM).next() {
                Some(nested) => text_excluding(nested, heading),
                None => text_excluding(item, heading),
            };
            params.insert(
                text_of(heading).trim().to_string(),
                Value::String(value.trim().to_string()),
            );
        }
        Ok(params)
    }
}

/// `name` is the text before the first `(`; ids come from the item's links
fn author(item: ElementRef<'_>) -> Result<Author, ExtractError> {
    let text = text_of(item);
    let name = text.split('(').next().unwrap_or_default().trim().to_string();
    let ids = item
        .select(&LINK)
        .map(|a| {
            let url = a
                .value()
                .attr("href")
                .ok_or(ExtractError::MissingHref("authors"))?;
            Ok(AuthorId {
                kind: text_of(a),
                id: url.rsplit('/').next().unwrap_or(url).to_string(),
                url: url.to_string(),
            })
        })
        .collect::<Result<Vec<_>, ExtractError>>()?;
    Ok(Author {
        name,
        ids: (!ids.is_empty()).then_some(ids),
    })
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

fn first_text(
    el: ElementRef<'_>,
    selector: &Selector,
    field: &'static str,
    element: &'static str,
) -> Result<String, ExtractError> {
    el.select(selector)
        .next()
        .map(text_of)
        .ok_or(ExtractError::MissingElement { field, element })
}

/// Text of `el` leaving out everything inside `skip`
fn text_excluding(el: ElementRef<'_>, skip: ElementRef<'_>) -> String {
    el.descendants()
        .filter(|node| !node.ancestors().any(|a| a.id() == skip.id()))
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect()
}

fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://doi.ill.fr/";

    const PAGE: &str = r#"
<html><body>
  <div class="actions">
    <a class="btn btn-info" href="/data?doi=10.5291/ILL-DATA.1-01-1&amp;proposal=84021">Download Data</a>
    <a class="btn btn-info" href="/report/84021.pdf">Experimental Report</a>
  </div>
  <div class="details">
    <div><h4 class="details-name">Proposal number</h4> 1-01-1 </div>
    <div><h4 class="details-name">Instruments</h4>
      <a href="https://www.ill.eu/d22">
        D22   small
        angle
      </a>
      <a href="https://www.ill.eu/d11">D11</a>
    </div>
    <div><h4 class="details-name">Authors</h4>
      <ul>
        <li>Jane Doe (ILL) <a href="https://orcid.org/0000-0001-2345-6789">ORCID</a></li>
        <li>John Smith (ESRF)</li>
      </ul>
    </div>
    <div><h4 class="details-name">Publication year</h4> Published 2019</div>
    <div><h4 class="details-name">Cycles</h4>
      <ul><li><span>Cycle   192 </span>
        <span>Cycle 193 )</span></li></ul>
    </div>
  </div>
  <section>
    <header><h3>Experiment Parameters</h3></header>
    <ul>
      <li><h4>Temperature</h4><div>between 1.5 K</div></li>
      <li><h4>Pressure</h4><div>1 bar</div></li>
    </ul>
  </section>
  <section>
    <header><h3>Sample Parameters</h3></header>
    <ul>
      <li><h4>Formula</h4>H2O</li>
      <li><h4>Form</h4><ul><li>powder</li></ul></li>
    </ul>
  </section>
</body></html>
"#;

    fn extractor() -> HtmlExtractor {
        HtmlExtractor::parse(PAGE, BASE)
    }

    #[test]
    fn data_and_report_urls() {
        let e = extractor();
        assert_eq!(
            e.data_url().unwrap(),
            "https://doi.ill.fr//data?doi=10.5291/ILL-DATA.1-01-1&proposal=84021"
        );
        assert_eq!(
            e.experimental_report_url().unwrap(),
            "https://doi.ill.fr/report/84021.pdf"
        );
    }

    #[test]
    fn proposal_id_is_last_query_value() {
        assert_eq!(proposal_id("https://x/data?doi=a&proposal=84021"), "84021");
        assert_eq!(proposal_id("https://x/data?id=7"), "7");
        assert_eq!(proposal_id("plain"), "plain");
    }

    #[test]
    fn proposal_number_without_heading() {
        assert_eq!(extractor().proposal_number().unwrap(), "1-01-1");
    }

    #[test]
    fn instruments_collapse_whitespace() {
        let instruments = extractor().instruments().unwrap();
        assert_eq!(
            instruments,
            vec![
                Instrument {
                    name: "D22 small angle".into(),
                    url: "https://www.ill.eu/d22".into()
                },
                Instrument {
                    name: "D11".into(),
                    url: "https://www.ill.eu/d11".into()
                },
            ]
        );
    }

    #[test]
    fn authors_with_and_without_ids() {
        let authors = extractor().authors().unwrap();
        assert_eq!(authors[0].name, "Jane Doe");
        let ids = authors[0].ids.as_ref().unwrap();
        assert_eq!(ids[0].kind, "ORCID");
        assert_eq!(ids[0].id, "0000-0001-2345-6789");
        assert_eq!(authors[1].name, "John Smith");
        assert!(authors[1].ids.is_none());

        let value = serde_json::to_value(&authors[1]).unwrap();
        assert_eq!(value, json!({"name": "John Smith"}));
    }

    #[test]
    fn publication_year_is_last_word() {
        assert_eq!(extractor().publication_year().unwrap(), "2019");
    }

    #[test]
    fn cycles_are_normalised_and_empties_dropped() {
        assert_eq!(
            extractor().cycles().unwrap(),
            vec!["Cycle 192".to_string(), "Cycle 193)".to_string()]
        );
    }

    #[test]
    fn experimental_parameters_keep_last_word() {
        let params = extractor().experimental_parameters().unwrap();
        assert_eq!(params["Temperature"], "K");
        assert_eq!(params["Pressure"], "bar");
        let keys: Vec<_> = params.keys().collect();
        assert_eq!(keys, vec!["Temperature", "Pressure"]);
    }

    #[test]
    fn sample_parameters_prefer_nested_item() {
        let params = extractor().sample_parameters().unwrap();
        assert_eq!(params["Formula"], "H2O");
        assert_eq!(params["Form"], "powder");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn full_document_serializes_camel_case() {
        let doc = extract_document("https://doi.ill.fr/10.5291/ILL-DATA.1-01-1", &extractor())
            .unwrap();
        assert_eq!(doc.proposal_id, "84021");
        let value = serde_json::to_value(&doc).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                "documentDoiUrl",
                "experimentalReportUrl",
                "dataUrl",
                "proposalNumber",
                "proposalId",
                "instruments",
                "metadata"
            ]
        );
        assert_eq!(value["metadata"]["publicationYear"], "2019");
    }

    #[test]
    fn missing_download_button_fails_document() {
        let page = PAGE.replace("Download Data", "Browse");
        let e = HtmlExtractor::parse(&page, BASE);
        assert_eq!(
            extract_document("u", &e).unwrap_err(),
            ExtractError::MissingButton("Download Data")
        );
    }

    #[test]
    fn missing_report_is_empty() {
        let page = PAGE.replace("Experimental Report", "Other");
        let e = HtmlExtractor::parse(&page, BASE);
        assert_eq!(e.experimental_report_url().unwrap(), "");
    }

    #[test]
    fn missing_heading_fails_field() {
        let page = PAGE.replace("Publication year", "Year");
        let e = HtmlExtractor::parse(&page, BASE);
        assert_eq!(
            e.publication_year().unwrap_err(),
            ExtractError::MissingLabel("Publication year")
        );
        assert!(extract_document("u", &e).is_err());
    }

    #[test]
    fn experiment_parameter_without_value_fails() {
        let page = PAGE.replace("<div>1 bar</div>", "");
        let e = HtmlExtractor::parse(&page, BASE);
        assert!(matches!(
            e.experimental_parameters().unwrap_err(),
            ExtractError::MissingElement { element: "div", .. }
        ));
    }

    #[test]
    fn collapse_whitespace_squeezes_spaces() {
        assert_eq!(collapse_whitespace("  a\n   b  c "), "a b c");
        assert_eq!(collapse_whitespace("\n  \n"), "");
    }
}
