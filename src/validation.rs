// Request payload validation
//
// Each payload deserializes with every field optional so that a missing field
// is reported per field instead of as a JSON error. `validate` either returns
// the cleaned values or the collected field errors.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::database::models::{LabelKind, NewRecipe, RecipeFilter};

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_EMAIL_LENGTH: usize = 255;
pub const MAX_LINK_LENGTH: usize = 255;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

/// Per-field error messages; the first message recorded for a field wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }

    /// `Ok(value)` when nothing was recorded
    fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupPayload {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SignupPayload {
    pub fn validate(self, min_password_length: usize) -> Result<Signup, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = required(&mut errors, "email", self.email).and_then(|raw| match normalize_email(&raw) {
            Some(email) => Some(email),
            None => {
                errors.add("email", "Enter a valid email address.");
                None
            }
        });
        let password = required(&mut errors, "password", self.password)
            .and_then(|password| check_password(&mut errors, password, min_password_length));
        let name = self.name.map(|name| name.trim().to_string()).unwrap_or_default();
        check_length(&mut errors, "name", &name, MAX_NAME_LENGTH);

        match (email, password) {
            (Some(email), Some(password)) => errors.finish(Signup { email, password, name }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl CredentialsPayload {
    /// Returns the normalized email and the password exactly as sent
    pub fn validate(self) -> Result<(String, String), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = required(&mut errors, "email", self.email).map(|raw| normalize_email(&raw).unwrap_or(raw));
        let password = required(&mut errors, "password", self.password);
        if password.as_deref() == Some("") {
            errors.add("password", BLANK);
        }

        match (email, password) {
            (Some(email), Some(password)) => errors.finish((email, password)),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfilePayload {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

impl ProfilePayload {
    pub fn validate(self, min_password_length: usize) -> Result<ProfileUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.map(|name| name.trim().to_string());
        if let Some(name) = &name {
            check_length(&mut errors, "name", name, MAX_NAME_LENGTH);
        }
        let password = self
            .password
            .and_then(|password| check_password(&mut errors, password, min_password_length));

        errors.finish(ProfileUpdate { name, password })
    }
}

/// Body of an ingredient or tag create
#[derive(Debug, Default, Deserialize)]
pub struct LabelPayload {
    pub name: Option<String>,
}

impl LabelPayload {
    pub fn validate(self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = check_name(&mut errors, self.name);
        match name {
            Some(name) => errors.finish(name),
            None => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipePayload {
    pub name: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub ingredients: Option<Vec<i64>>,
    pub tags: Option<Vec<i64>>,
}

impl RecipePayload {
    /// Field checks only; whether the referenced ids belong to the caller is
    /// decided by the store inside the create
    pub fn validate(self) -> Result<NewRecipe, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = check_name(&mut errors, self.name);

        let time_minutes = match self.time_minutes.unwrap_or(0) {
            minutes if minutes < 0 => {
                errors.add("time_minutes", "Ensure this value is greater than or equal to 0.");
                0
            }
            minutes => i32::try_from(minutes).unwrap_or_else(|_| {
                errors.add("time_minutes", format!("Ensure this value is less than or equal to {}.", i32::MAX));
                0
            }),
        };

        let price = check_price(&mut errors, self.price.unwrap_or(Decimal::ZERO));
        let link = check_link(&mut errors, self.link);

        match name {
            Some(name) => errors.finish(NewRecipe {
                name,
                time_minutes,
                price,
                link,
                ingredients: normalize_ids(self.ingredients.unwrap_or_default()),
                tags: normalize_ids(self.tags.unwrap_or_default()),
            }),
            None => Err(errors),
        }
    }
}

/// Query string of the ingredient and tag list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct LabelQuery {
    pub assigned_only: Option<String>,
}

impl LabelQuery {
    pub fn assigned_only(&self) -> Result<bool, ValidationErrors> {
        parse_flag("assigned_only", self.assigned_only.as_deref())
    }
}

/// Query string of the recipe list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    pub ingredients: Option<String>,
    pub tags: Option<String>,
}

impl RecipeQuery {
    pub fn filter(&self) -> Result<RecipeFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut parse = |kind: LabelKind, raw: Option<&str>| match raw {
            Some(raw) => parse_id_list(kind.field(), raw).unwrap_or_else(|e| {
                for (field, message) in e.into_fields() {
                    errors.add(&field, message);
                }
                Vec::new()
            }),
            None => Vec::new(),
        };
        let ingredients = parse(LabelKind::Ingredient, self.ingredients.as_deref());
        let tags = parse(LabelKind::Tag, self.tags.as_deref());
        errors.finish(RecipeFilter { ingredients, tags })
    }
}

/// Integer-style boolean flag: absent or `0` is false, any other integer is
/// true; `true`/`false` are accepted as well
pub fn parse_flag(field: &str, raw: Option<&str>) -> Result<bool, ValidationErrors> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(false);
    };
    match raw {
        "" => Ok(false),
        "true" | "True" => Ok(true),
        "false" | "False" => Ok(false),
        other => other
            .parse::<i64>()
            .map(|value| value != 0)
            .map_err(|_| ValidationErrors::single(field, "A valid integer is required.")),
    }
}

/// Comma separated ids, e.g. `1,2,3`; an empty string is an empty list
pub fn parse_id_list(field: &str, raw: &str) -> Result<Vec<i64>, ValidationErrors> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let ids = raw
        .split(',')
        .map(|part| part.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ValidationErrors::single(field, format!("Expected comma separated ids, got \"{}\".", raw)))?;
    Ok(normalize_ids(ids))
}

/// Trim the address and lowercase its domain part; `None` when the result
/// does not look like an email address
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_EMAIL_LENGTH || trimmed.chars().any(char::is_whitespace) {
        return None;
    }

    let (local, domain) = trimmed.rsplit_once('@')?;
    if local.is_empty() || local.contains('@') {
        return None;
    }
    let labels_ok = domain
        .split('.')
        .all(|label| !label.is_empty() && label.chars().all(|c| c.is_alphanumeric() || c == '-'));
    if !domain.contains('.') || !labels_ok {
        return None;
    }

    Some(format!("{}@{}", local, domain.to_lowercase()))
}

fn required(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    if value.is_none() {
        errors.add(field, REQUIRED);
    }
    value
}

fn check_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) -> bool {
    if value.chars().count() > max {
        errors.add(field, format!("Ensure this field has no more than {} characters.", max));
        return false;
    }
    true
}

fn check_name(errors: &mut ValidationErrors, name: Option<String>) -> Option<String> {
    let name = required(errors, "name", name)?.trim().to_string();
    if name.is_empty() {
        errors.add("name", BLANK);
        return None;
    }
    check_length(errors, "name", &name, MAX_NAME_LENGTH).then_some(name)
}

fn check_password(errors: &mut ValidationErrors, password: String, min: usize) -> Option<String> {
    if password.chars().count() < min {
        errors.add("password", format!("Ensure this field has at least {} characters.", min));
        return None;
    }
    Some(password)
}

/// Non-negative, at most two decimal places and five digits overall; stored
/// with exactly two decimal places
fn check_price(errors: &mut ValidationErrors, price: Decimal) -> Decimal {
    let mut price = price.normalize();
    if price.is_sign_negative() && !price.is_zero() {
        errors.add("price", "Ensure this value is greater than or equal to 0.");
    } else if price.scale() > 2 {
        errors.add("price", "Ensure that there are no more than 2 decimal places.");
    } else if price > Decimal::new(99999, 2) {
        errors.add("price", "Ensure that there are no more than 5 digits in total.");
    }
    price.rescale(2);
    price
}

/// An empty link means no link; anything else must be an absolute http(s) URL
fn check_link(errors: &mut ValidationErrors, link: Option<String>) -> Option<String> {
    let link = link.map(|link| link.trim().to_string()).filter(|link| !link.is_empty())?;
    if !check_length(errors, "link", &link, MAX_LINK_LENGTH) {
        return None;
    }
    match url::Url::parse(&link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Some(link),
        _ => {
            errors.add("link", "Enter a valid URL.");
            None
        }
    }
}

fn normalize_ids(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
