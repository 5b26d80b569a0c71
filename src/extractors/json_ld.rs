use crate::model::ExtractedRecipe;
use html_escape::decode_html_entities;
use log::debug;
use regex::Regex;
use scraper::{Html, Selector};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

static JSON_LD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("Invalid JSON-LD selector")
});

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^PT(?:(\d+)H)?(?:(\d+)M)?(?:\d+(?:\.\d+)?S)?$").expect("Invalid duration regex")
});

// "1.", "2)", "Step 3:" and friends at the start of an instruction
static STEP_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:step\s*)?\d+\s*[.):]\s+").expect("Invalid step number regex")
});

const GRAPH_KEY: &str = "@graph";
const RECIPE_TYPE: &str = "Recipe";

/// Shape of one value inside a JSON-LD document, as far as recipe lookup cares.
#[derive(Debug)]
pub enum GraphNode<'a> {
    Recipe(&'a Value),
    Wrapper(&'a Value),
    Array(&'a [Value]),
    Ignored,
}

impl<'a> From<&'a Value> for GraphNode<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => GraphNode::Array(items),
            Value::Object(_) if is_recipe_type(value) => GraphNode::Recipe(value),
            Value::Object(map) => match map.get(GRAPH_KEY) {
                Some(inner) => GraphNode::Wrapper(inner),
                None => GraphNode::Ignored,
            },
            _ => GraphNode::Ignored,
        }
    }
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case(RECIPE_TYPE),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case(RECIPE_TYPE)),
        _ => false,
    }
}

/// Find the first usable recipe across every JSON-LD block in the page.
///
/// Blocks that fail to parse are skipped. The returned record may be
/// incomplete (see [`ExtractedRecipe::is_complete`]); callers decide whether
/// that is good enough.
pub fn extract(document: &Html, url: &str) -> Option<ExtractedRecipe> {
    let blocks: Vec<String> = document
        .select(&JSON_LD_SELECTOR)
        .map(|script| script.inner_html())
        .collect();
    debug!("Found {} JSON-LD blocks", blocks.len());

    blocks.iter().enumerate().find_map(|(index, raw)| {
        let value = match parse_block(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!("Skipping JSON-LD block {}: {}", index, e);
                return None;
            }
        };
        let found = resolve(&value, url);
        if found.is_none() {
            debug!("No recipe in JSON-LD block {}", index);
        }
        found
    })
}

/// Convenience wrapper for callers holding raw HTML.
pub fn extract_from_html(html: &str, url: &str) -> Option<ExtractedRecipe> {
    extract(&Html::parse_document(html), url)
}

fn parse_block(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw).or_else(|_| {
        // Raw line breaks inside string literals are the usual culprit
        let cleaned: String = raw
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();
        serde_json::from_str(&cleaned)
    })
}

/// Walk a parsed JSON-LD value and return the first recipe node with a real name.
pub fn resolve(value: &Value, url: &str) -> Option<ExtractedRecipe> {
    match GraphNode::from(value) {
        GraphNode::Array(items) => items.iter().find_map(|item| resolve(item, url)),
        GraphNode::Recipe(node) => recipe_from_node(node, url),
        GraphNode::Wrapper(inner) => resolve(inner, url),
        GraphNode::Ignored => None,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonLdRecipe {
    name: Option<Value>,
    description: Option<Value>,
    image: Option<ImageType>,
    #[serde(rename = "recipeIngredient", alias = "ingredients")]
    recipe_ingredient: Option<Value>,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Option<Value>,
    #[serde(rename = "recipeYield")]
    recipe_yield: Option<Value>,
    #[serde(rename = "prepTime")]
    prep_time: Option<Value>,
    #[serde(rename = "cookTime")]
    cook_time: Option<Value>,
    author: Option<Author>,
}

#[derive(Debug, Deserialize)]
struct UrlObject {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageType {
    String(String),
    MultipleStrings(Vec<String>),
    MultipleObjects(Vec<UrlObject>),
    Object(UrlObject),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct AuthorObject {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorEntry {
    Name(String),
    Object(AuthorObject),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Author {
    String(String),
    Multiple(Vec<AuthorEntry>),
    Object(AuthorObject),
    Other(IgnoredAny),
}

fn recipe_from_node(node: &Value, url: &str) -> Option<ExtractedRecipe> {
    let recipe: JsonLdRecipe = match serde_json::from_value(node.clone()) {
        Ok(recipe) => recipe,
        Err(e) => {
            debug!("Recipe node did not deserialize: {}", e);
            return None;
        }
    };

    let name = recipe
        .name
        .as_ref()
        .and_then(Value::as_str)
        .map(decode_html_symbols)
        .unwrap_or_default();
    if name.is_empty() {
        debug!("Recipe node without a name, skipping");
        return None;
    }

    Some(ExtractedRecipe {
        name,
        ingredients: recipe
            .recipe_ingredient
            .as_ref()
            .map(ingredient_lines)
            .unwrap_or_default(),
        directions: recipe
            .recipe_instructions
            .as_ref()
            .map(numbered_directions)
            .unwrap_or_default(),
        prep_time: recipe
            .prep_time
            .as_ref()
            .and_then(Value::as_str)
            .map(format_duration)
            .unwrap_or_default(),
        cook_time: recipe
            .cook_time
            .as_ref()
            .and_then(Value::as_str)
            .map(format_duration)
            .unwrap_or_default(),
        servings: recipe
            .recipe_yield
            .as_ref()
            .map(servings_text)
            .unwrap_or_default(),
        source: recipe.author.and_then(author_name).unwrap_or_default(),
        source_url: url.to_string(),
        notes: recipe
            .description
            .as_ref()
            .and_then(Value::as_str)
            .map(decode_html_symbols)
            .unwrap_or_default(),
        image_url: recipe.image.and_then(first_image),
    })
}

fn ingredient_lines(value: &Value) -> String {
    let lines: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(decode_html_symbols)
            .filter(|line| !line.is_empty())
            .collect(),
        Value::String(s) => s
            .lines()
            .map(decode_html_symbols)
            .filter(|line| !line.is_empty())
            .collect(),
        _ => Vec::new(),
    };
    lines.join("\n")
}

/// Flatten instructions of any shape into "1. ..." lines, renumbered from one.
fn numbered_directions(value: &Value) -> String {
    let mut steps = Vec::new();
    collect_steps(value, &mut steps);

    steps
        .iter()
        .map(|step| STEP_NUMBER_REGEX.replace(step, "").trim().to_string())
        .filter(|step| !step.is_empty())
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_steps(value: &Value, steps: &mut Vec<String>) {
    match value {
        Value::String(s) => steps.extend(s.lines().map(decode_html_symbols)),
        Value::Array(items) => items.iter().for_each(|item| collect_steps(item, steps)),
        Value::Object(map) => {
            if let Some(items) = map.get("itemListElement") {
                collect_steps(items, steps);
            } else if let Some(text) = map
                .get("text")
                .and_then(Value::as_str)
                .or_else(|| map.get("name").and_then(Value::as_str))
            {
                steps.push(decode_html_symbols(text));
            }
        }
        _ => {}
    }
}

fn servings_text(value: &Value) -> String {
    match value {
        Value::String(s) => decode_html_symbols(s),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.first().map(servings_text).unwrap_or_default(),
        _ => String::new(),
    }
}

fn first_image(image: ImageType) -> Option<String> {
    let url = match image {
        ImageType::String(s) => Some(s),
        ImageType::MultipleStrings(v) => v.into_iter().next(),
        ImageType::MultipleObjects(v) => v.into_iter().find_map(|o| o.url),
        ImageType::Object(o) => o.url,
        ImageType::Other(_) => None,
    };
    url.map(|u| decode_html_symbols(&u)).filter(|u| !u.is_empty())
}

fn author_name(author: Author) -> Option<String> {
    let name = match author {
        Author::String(s) => Some(s),
        Author::Multiple(entries) => entries.into_iter().next().and_then(|e| match e {
            AuthorEntry::Name(s) => Some(s),
            AuthorEntry::Object(o) => o.name,
            AuthorEntry::Other(_) => None,
        }),
        Author::Object(o) => o.name,
        Author::Other(_) => None,
    };
    name.map(|n| decode_html_symbols(&n)).filter(|n| !n.is_empty())
}

/// Render a compact ISO-8601 duration ("PT1H30M") as "1 hour 30 min".
/// Anything that isn't hour/minute notation renders as an empty string.
pub fn format_duration(duration: &str) -> String {
    let Some(caps) = DURATION_REGEX.captures(duration.trim()) else {
        return String::new();
    };
    let hours = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
    let minutes = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());

    let hour_text = |h: u32| format!("{} hour{}", h, if h == 1 { "" } else { "s" });
    match (hours, minutes) {
        (Some(h), Some(m)) => format!("{} {} min", hour_text(h), m),
        (Some(h), None) => hour_text(h),
        (None, Some(m)) => format!("{m} min"),
        (None, None) => String::new(),
    }
}

fn decode_html_symbols(text: &str) -> String {
    // Some sites double-escape their entities
    decode_html_entities(&decode_html_entities(text))
        .trim()
        .to_string()
}
