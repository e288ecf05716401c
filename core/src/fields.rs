//! Form field schema as returned by `app/form/fields.json`.
//!
//! # Design
//! `properties` keeps the order kintone sends, which is the order fields are
//! laid out on the form. `serde_json::Map` would sort the codes, so
//! `FieldProperties` deserializes the map itself into a `Vec`.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// The whole field schema of an app.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldsJson {
    pub properties: FieldProperties,
    #[serde(default)]
    pub revision: String,
}

impl FieldsJson {
    pub fn has_subtable(&self) -> bool {
        self.properties
            .iter()
            .any(|p| p.field_type == FieldType::Subtable)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldProperty {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub label: String,
    /// Only present on `SUBTABLE` fields.
    #[serde(default)]
    pub fields: Option<FieldProperties>,
}

impl FieldProperty {
    pub fn subtable_fields(&self) -> Option<&FieldProperties> {
        match self.field_type {
            FieldType::Subtable => self.fields.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    SingleLineText,
    MultiLineText,
    RichText,
    Number,
    Calc,
    RadioButton,
    CheckBox,
    MultiSelect,
    DropDown,
    Date,
    Time,
    Datetime,
    Link,
    File,
    UserSelect,
    OrganizationSelect,
    GroupSelect,
    Subtable,
    ReferenceTable,
    Group,
    Label,
    Spacer,
    Hr,
    RecordNumber,
    Creator,
    CreatedTime,
    Modifier,
    UpdatedTime,
    Status,
    StatusAssignee,
    Category,
    #[serde(rename = "__ID__")]
    Id,
    #[serde(rename = "__REVISION__")]
    Revision,
    #[serde(other)]
    Unknown,
}

impl FieldType {
    /// Whether a value of this type can be sent when adding a record.
    pub fn is_importable(self) -> bool {
        !matches!(
            self,
            FieldType::Calc
                | FieldType::File
                | FieldType::ReferenceTable
                | FieldType::Group
                | FieldType::Label
                | FieldType::Spacer
                | FieldType::Hr
                | FieldType::RecordNumber
                | FieldType::Status
                | FieldType::StatusAssignee
                | FieldType::Category
                | FieldType::Id
                | FieldType::Revision
                | FieldType::Unknown
        )
    }
}

/// Field properties in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldProperties(Vec<FieldProperty>);

impl FieldProperties {
    pub fn iter(&self) -> std::slice::Iter<'_, FieldProperty> {
        self.0.iter()
    }

    pub fn get(&self, code: &str) -> Option<&FieldProperty> {
        self.0.iter().find(|p| p.code == code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<FieldProperty> for FieldProperties {
    fn from_iter<I: IntoIterator<Item = FieldProperty>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FieldProperties {
    type Item = &'a FieldProperty;
    type IntoIter = std::slice::Iter<'a, FieldProperty>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for FieldProperties {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = FieldProperties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field code to field property")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut properties = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((code, mut property)) = map.next_entry::<String, FieldProperty>()? {
                    if property.code.is_empty() {
                        property.code = code;
                    }
                    properties.push(property);
                }
                Ok(FieldProperties(properties))
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}
