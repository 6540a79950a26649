use crate::model::{Formula, PropertyValue, Rollup, plain_text, truncate_date};

const CHECKED: &str = "✅";
const UNCHECKED: &str = "☐";

fn checkbox(checked: bool) -> String {
    let mark = if checked { CHECKED } else { UNCHECKED };
    mark.to_string()
}

fn or_empty<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Renders a property value as display text. Absent values give `""`;
/// relations, rollup arrays and files give only a count.
pub fn property_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Title(runs) | PropertyValue::RichText(runs) => plain_text(runs),
        PropertyValue::Number(number) => or_empty(number),
        PropertyValue::Select(option) | PropertyValue::Status(option) => option
            .as_ref()
            .map(|o| o.name.clone())
            .unwrap_or_default(),
        PropertyValue::MultiSelect(options) => options
            .iter()
            .map(|o| o.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        PropertyValue::Date(date) => match date {
            Some(range) => match range.end.as_deref() {
                Some(end) => format!("{} → {}", range.start, end),
                None => range.start.clone(),
            },
            None => String::new(),
        },
        PropertyValue::People(people) => people
            .iter()
            .filter_map(|user| {
                user.name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .or_else(|| user.person.as_ref().and_then(|p| p.email.as_deref()))
                    .filter(|name| !name.is_empty())
            })
            .collect::<Vec<_>>()
            .join(", "),
        PropertyValue::Checkbox(checked) => checkbox(*checked),
        PropertyValue::Url(value)
        | PropertyValue::Email(value)
        | PropertyValue::PhoneNumber(value) => or_empty(value),
        PropertyValue::Formula(formula) => match formula {
            Formula::String(value) => or_empty(value),
            Formula::Number(number) => or_empty(number),
            Formula::Boolean(value) => checkbox(value.unwrap_or(false)),
            Formula::Date(date) => date.as_ref().map(|d| d.start.clone()).unwrap_or_default(),
            Formula::Other => String::new(),
        },
        PropertyValue::Relation(count) => format!("({count} items)"),
        PropertyValue::Rollup(rollup) => match rollup {
            Rollup::Number(number) => or_empty(number),
            Rollup::Array(count) => format!("({count} items)"),
            Rollup::Other => String::new(),
        },
        PropertyValue::CreatedTime(time) | PropertyValue::LastEditedTime(time) => {
            truncate_date(time).to_string()
        }
        PropertyValue::CreatedBy(user) | PropertyValue::LastEditedBy(user) => {
            user.display_name().to_string()
        }
        PropertyValue::Files(count) => format!("({count} files)"),
        PropertyValue::Unknown(kind) => format!("[{kind}]"),
    }
}
