//! Binds flat form fields into nested serde types
//!
//! Keys are split on `.` into a tree. Leaves hold every value submitted under
//! their key. Scalars take the first value; sequences take all of them.
//! A sequence may also be spelled with index segments, `phones.0.label`,
//! and is then ordered by index.

use serde::de::{
    value::{MapDeserializer, SeqDeserializer, StringDeserializer},
    DeserializeOwned, Deserializer, IntoDeserializer, Visitor,
};

use super::FormError;

/// Bind `(key, value)` pairs into a `T`
pub(super) fn from_pairs<T, I>(pairs: I) -> Result<T, FormError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (String, String)>,
{
    let mut root = Node::Map(Vec::new());
    for (key, value) in pairs {
        root.insert(&key, value)?;
    }
    T::deserialize(root)
}

#[derive(Debug, PartialEq)]
enum Node {
    Values(Vec<String>),
    Map(Vec<(String, Node)>),
}

impl Node {
    fn insert(&mut self, key: &str, value: String) -> Result<(), FormError> {
        let conflict = || FormError::ConflictingKey(key.to_owned());

        let mut node = self;
        let mut segments = key.split('.').peekable();
        while let Some(segment) = segments.next() {
            let Node::Map(entries) = node else {
                return Err(conflict());
            };

            let index = match entries.iter().position(|(name, _)| name == segment) {
                Some(index) => index,
                None => {
                    let child = if segments.peek().is_some() {
                        Node::Map(Vec::new())
                    } else {
                        Node::Values(Vec::new())
                    };
                    entries.push((segment.to_owned(), child));
                    entries.len() - 1
                }
            };
            node = &mut entries[index].1;
        }

        match node {
            Node::Values(values) => {
                values.push(value);
                Ok(())
            }
            Node::Map(_) => Err(conflict()),
        }
    }

    fn into_scalar(self) -> Result<String, FormError> {
        match self {
            Node::Values(values) => values
                .into_iter()
                .next()
                .ok_or_else(|| FormError::Bind("empty form value".to_owned())),
            Node::Map(_) => Err(FormError::Bind(
                "expected a value, found nested form keys".to_owned(),
            )),
        }
    }
}

fn invalid(value: String, reason: impl ToString) -> FormError {
    FormError::InvalidValue {
        value,
        reason: reason.to_string(),
    }
}

fn parse_bool(text: String) -> Result<bool, FormError> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" => Ok(false),
        _ => Err(invalid(text, "expected a boolean")),
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
                let text = self.into_scalar()?;
                match text.trim().parse::<$ty>() {
                    Ok(parsed) => visitor.$visit(parsed),
                    Err(err) => Err(invalid(text, err)),
                }
            }
        )*
    };
}

impl<'de> IntoDeserializer<'de, FormError> for Node {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for Node {
    type Error = FormError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        match self {
            Node::Values(values) if values.len() == 1 => {
                visitor.visit_string(values.into_iter().next().unwrap_or_default())
            }
            values @ Node::Values(_) => values.deserialize_seq(visitor),
            map @ Node::Map(_) => map.deserialize_map(visitor),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
        deserialize_char => visit_char(char),
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        visitor.visit_bool(parse_bool(self.into_scalar()?)?)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        visitor.visit_string(self.into_scalar()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        visitor.visit_string(self.into_scalar()?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        visitor.visit_byte_buf(self.into_scalar()?.into_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        // A submitted but empty field is treated as absent
        let empty = matches!(&self, Node::Values(values) if values.iter().all(String::is_empty));
        if empty {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, FormError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, FormError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        match self {
            Node::Values(values) => {
                let mut seq: SeqDeserializer<_, FormError> =
                    SeqDeserializer::new(values.into_iter().map(|value| Node::Values(vec![value])));
                let result = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(result)
            }
            Node::Map(entries) => {
                let mut indexed = entries
                    .into_iter()
                    .map(|(key, node)| match key.parse::<usize>() {
                        Ok(index) => Ok((index, node)),
                        Err(_) => Err(FormError::Bind(format!(
                            "expected an index in form key, found {key:?}"
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                indexed.sort_by_key(|(index, _)| *index);

                let mut seq: SeqDeserializer<_, FormError> =
                    SeqDeserializer::new(indexed.into_iter().map(|(_, node)| node));
                let result = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(result)
            }
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, FormError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, FormError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        match self {
            Node::Map(entries) => {
                let mut map: MapDeserializer<'de, _, FormError> =
                    MapDeserializer::new(entries.into_iter());
                let result = visitor.visit_map(&mut map)?;
                map.end()?;
                Ok(result)
            }
            Node::Values(_) => Err(FormError::Bind(
                "expected nested form keys, found a value".to_owned(),
            )),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, FormError> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, FormError> {
        let variant: StringDeserializer<FormError> = self.into_scalar()?.into_deserializer();
        visitor.visit_enum(variant)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, FormError> {
        visitor.visit_unit()
    }
}
