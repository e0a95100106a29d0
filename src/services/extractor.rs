use scraper::{ElementRef, Html, Selector};

use crate::{
    domain::{
        price::normalize_price,
        record::{FieldValue, Record, NOT_AVAILABLE},
    },
    error::ScrapeError,
    services::fetcher::PageContent,
};

/// How one field of an item is read. Required kinds drop the whole item
/// when absent; optional kinds substitute a value instead.
enum FieldKind {
    Text {
        selector: Selector,
        fallback: Option<String>,
    },
    JoinedText {
        selector: Selector,
        separator: String,
    },
    Attr {
        selector: Selector,
        attr: String,
    },
    Price {
        selector: Selector,
    },
    Presence {
        selector: Selector,
        present: String,
        absent: String,
    },
    Constant {
        value: String,
    },
}

pub struct FieldRule {
    name: String,
    kind: FieldKind,
}

fn parse_selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css.to_string()))
}

impl FieldRule {
    /// Required text field: items without it are skipped.
    pub fn text(name: &str, css: &str) -> Result<Self, ScrapeError> {
        Ok(FieldRule {
            name: name.to_string(),
            kind: FieldKind::Text {
                selector: parse_selector(css)?,
                fallback: None,
            },
        })
    }

    /// Optional text field, written as "N/A" when absent.
    pub fn text_or_missing(name: &str, css: &str) -> Result<Self, ScrapeError> {
        Ok(FieldRule {
            name: name.to_string(),
            kind: FieldKind::Text {
                selector: parse_selector(css)?,
                fallback: Some(NOT_AVAILABLE.to_string()),
            },
        })
    }

    /// Required list field: every match joined with `separator`.
    pub fn joined_text(name: &str, css: &str, separator: &str) -> Result<Self, ScrapeError> {
        Ok(FieldRule {
            name: name.to_string(),
            kind: FieldKind::JoinedText {
                selector: parse_selector(css)?,
                separator: separator.to_string(),
            },
        })
    }

    /// Required attribute lookup on the first match.
    pub fn attr(name: &str, css: &str, attr: &str) -> Result<Self, ScrapeError> {
        Ok(FieldRule {
            name: name.to_string(),
            kind: FieldKind::Attr {
                selector: parse_selector(css)?,
                attr: attr.to_string(),
            },
        })
    }

    /// Price field, normalized to a number; a missing element or an
    /// unparseable price degrades to "N/A" rather than dropping the item.
    pub fn price(name: &str, css: &str) -> Result<Self, ScrapeError> {
        Ok(FieldRule {
            name: name.to_string(),
            kind: FieldKind::Price {
                selector: parse_selector(css)?,
            },
        })
    }

    /// Maps element existence to one of two fixed strings.
    pub fn presence(name: &str, css: &str, present: &str, absent: &str) -> Result<Self, ScrapeError> {
        Ok(FieldRule {
            name: name.to_string(),
            kind: FieldKind::Presence {
                selector: parse_selector(css)?,
                present: present.to_string(),
                absent: absent.to_string(),
            },
        })
    }

    /// Fixed value stamped onto every record, e.g. a category column.
    pub fn constant(name: &str, value: &str) -> Self {
        FieldRule {
            name: name.to_string(),
            kind: FieldKind::Constant {
                value: value.to_string(),
            },
        }
    }

    fn evaluate(&self, item: ElementRef<'_>) -> Option<FieldValue> {
        match &self.kind {
            FieldKind::Text { selector, fallback } => match item.select(selector).next() {
                Some(el) => Some(FieldValue::Text(element_text(el))),
                None => fallback.clone().map(FieldValue::Text),
            },
            FieldKind::JoinedText { selector, separator } => {
                let parts: Vec<String> = item.select(selector).map(element_text).collect();
                match parts.is_empty() {
                    true => None,
                    false => Some(FieldValue::Text(parts.join(separator))),
                }
            }
            FieldKind::Attr { selector, attr } => item
                .select(selector)
                .next()
                .and_then(|el| el.attr(attr))
                .map(|value| FieldValue::Text(value.trim().to_string())),
            FieldKind::Price { selector } => {
                let value = item
                    .select(selector)
                    .next()
                    .and_then(|el| normalize_price(&element_text(el)))
                    .map(FieldValue::Number)
                    .unwrap_or_else(|| FieldValue::text(NOT_AVAILABLE));
                Some(value)
            }
            FieldKind::Presence {
                selector,
                present,
                absent,
            } => {
                let value = match item.select(selector).next().is_some() {
                    true => present.clone(),
                    false => absent.clone(),
                };
                Some(FieldValue::Text(value))
            }
            FieldKind::Constant { value } => Some(FieldValue::text(value.clone())),
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Selector-driven extractor: one record per container element.
pub struct PageExtractor {
    container: Selector,
    fields: Vec<FieldRule>,
}

impl PageExtractor {
    pub fn new(container_css: &str, fields: Vec<FieldRule>) -> Result<Self, ScrapeError> {
        Ok(PageExtractor {
            container: parse_selector(container_css)?,
            fields,
        })
    }

    /// Items missing a required field are dropped without affecting
    /// their siblings. Empty or unrecognizable markup yields an empty
    /// Vec; this never fails.
    pub fn extract(&self, content: &PageContent) -> Vec<Record> {
        let document = Html::parse_document(content.html());

        document
            .select(&self.container)
            .filter_map(|item| self.extract_item(item))
            .collect()
    }

    fn extract_item(&self, item: ElementRef<'_>) -> Option<Record> {
        let mut record = Record::new();
        for rule in &self.fields {
            let value = rule.evaluate(item)?;
            record.push(rule.name.clone(), value);
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldRule, PageExtractor};
    use crate::{domain::record::FieldValue, services::fetcher::PageContent};

    fn quote_extractor() -> PageExtractor {
        PageExtractor::new(
            "div.quote",
            vec![
                FieldRule::text("quote", "span.text").unwrap(),
                FieldRule::text("author", "small.author").unwrap(),
                FieldRule::joined_text("tags", "div.tags a.tag", ", ").unwrap(),
            ],
        )
        .unwrap()
    }

    fn product_extractor() -> PageExtractor {
        PageExtractor::new(
            "li.product",
            vec![
                FieldRule::text_or_missing("Product_Title", "h2.title").unwrap(),
                FieldRule::price("Price_EUR", "span.price").unwrap(),
                FieldRule::presence("Rating_Status", "div.star-rating", "Rated", "Unrated").unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn empty_content_yields_no_records() {
        let records = quote_extractor().extract(&PageContent::new(String::new()));
        assert!(records.is_empty());
    }

    #[test]
    fn unrecognizable_markup_yields_no_records() {
        let content = PageContent::new("<p>nothing to see here</p> <<< &&&".to_string());
        assert!(quote_extractor().extract(&content).is_empty());
    }

    #[test]
    fn extracts_all_fields_of_a_well_formed_item() {
        let content = PageContent::new(
            r#"<div class="quote">
                 <span class="text">  “Simplicity is the soul of efficiency.”  </span>
                 <small class="author">Austin Freeman</small>
                 <div class="tags">
                   <a class="tag">design</a>
                   <a class="tag">software</a>
                 </div>
               </div>"#
                .to_string(),
        );

        let records = quote_extractor().extract(&content);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("quote"),
            Some(&FieldValue::text("“Simplicity is the soul of efficiency.”"))
        );
        assert_eq!(records[0].get("author"), Some(&FieldValue::text("Austin Freeman")));
        assert_eq!(records[0].get("tags"), Some(&FieldValue::text("design, software")));
    }

    #[test]
    fn item_missing_a_required_field_is_skipped_alone() {
        let content = PageContent::new(
            r#"<div class="quote">
                 <span class="text">first</span>
                 <div class="tags"><a class="tag">one</a></div>
               </div>
               <div class="quote">
                 <span class="text">second</span>
                 <small class="author">Someone</small>
                 <div class="tags"><a class="tag">two</a></div>
               </div>"#
                .to_string(),
        );

        let records = quote_extractor().extract(&content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("quote"), Some(&FieldValue::text("second")));
    }

    #[test]
    fn optional_fields_substitute_instead_of_dropping() {
        let content = PageContent::new(
            r#"<li class="product">
                 <span class="price">€63.00</span>
               </li>"#
                .to_string(),
        );

        let records = product_extractor().extract(&content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Product_Title"), Some(&FieldValue::text("N/A")));
        assert_eq!(records[0].get("Price_EUR"), Some(&FieldValue::Number(63.0)));
        assert_eq!(records[0].get("Rating_Status"), Some(&FieldValue::text("Unrated")));
    }

    #[test]
    fn presence_field_reports_rated_when_element_exists() {
        let content = PageContent::new(
            r#"<li class="product">
                 <h2 class="title">Bulbasaur</h2>
                 <span class="price">€63.00</span>
                 <div class="star-rating"></div>
               </li>"#
                .to_string(),
        );

        let records = product_extractor().extract(&content);
        assert_eq!(records[0].get("Rating_Status"), Some(&FieldValue::text("Rated")));
    }

    #[test]
    fn garbage_price_degrades_to_sentinel() {
        let content = PageContent::new(
            r#"<li class="product">
                 <h2 class="title">Mystery</h2>
                 <span class="price">call us</span>
               </li>"#
                .to_string(),
        );

        let records = product_extractor().extract(&content);
        assert_eq!(records[0].get("Price_EUR"), Some(&FieldValue::text("N/A")));
    }

    #[test]
    fn attr_and_constant_rules() {
        let extractor = PageExtractor::new(
            "div.thumbnail",
            vec![
                FieldRule::attr("Product Model", "a.title", "title").unwrap(),
                FieldRule::constant("Category", "Laptops & Accessories"),
            ],
        )
        .unwrap();

        let content = PageContent::new(
            r#"<div class="thumbnail">
                 <a class="title" title="Asus VivoBook X441NA-GA190">Asus VivoBo...</a>
               </div>"#
                .to_string(),
        );

        let records = extractor.extract(&content);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("Product Model"),
            Some(&FieldValue::text("Asus VivoBook X441NA-GA190"))
        );
        assert_eq!(
            records[0].get("Category"),
            Some(&FieldValue::text("Laptops & Accessories"))
        );
    }
}
