use crate::{Error, Result};

/// Splits a property path like `orders[0].items` one segment at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTokenizer<'a> {
    name: &'a str,
    indexed_name: &'a str,
    index: Option<&'a str>,
    children: Option<&'a str>,
}

impl<'a> PropertyTokenizer<'a> {
    pub fn new(full_name: &'a str) -> PropertyTokenizer<'a> {
        let (indexed_name, children) = match full_name.find('.') {
            Some(delim) => (&full_name[..delim], Some(&full_name[delim + 1..])),
            None => (full_name, None),
        };

        // A segment only carries an index when it ends with the closing
        // bracket. Anything else is kept whole and rejected by `parse`.
        let (name, index) = match indexed_name.find('[') {
            Some(delim) => match indexed_name[delim + 1..].strip_suffix(']') {
                Some(index) => (&indexed_name[..delim], Some(index)),
                None => (indexed_name, None),
            },
            None => (indexed_name, None),
        };

        PropertyTokenizer {
            name,
            indexed_name,
            index,
            children,
        }
    }

    /// Like `new`, but checks every segment of the path for an unclosed
    /// index bracket.
    pub fn parse(full_name: &'a str) -> Result<PropertyTokenizer<'a>> {
        let first = PropertyTokenizer::new(full_name);

        let mut segment = Some(first.clone());
        while let Some(prop) = segment {
            if prop.index.is_none() && prop.indexed_name.contains('[') {
                return Err(Error::parse(format!(
                    "unclosed index in property '{full_name}'"
                )));
            }
            segment = prop.next();
        }

        Ok(first)
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The segment including its index, e.g. `orders[0]`.
    pub fn indexed_name(&self) -> &'a str {
        self.indexed_name
    }

    pub fn index(&self) -> Option<&'a str> {
        self.index
    }

    pub fn children(&self) -> Option<&'a str> {
        self.children
    }

    pub fn has_next(&self) -> bool {
        self.children.is_some()
    }

    pub fn next(&self) -> Option<PropertyTokenizer<'a>> {
        self.children.map(PropertyTokenizer::new)
    }
}

/// Derives the property name from an accessor name: `getFirstName` is
/// `firstName`, `isActive` is `active`, `getURL` stays `URL`.
pub fn method_to_property(name: &str) -> Result<String> {
    let stripped = if let Some(rest) = name.strip_prefix("is") {
        rest
    } else if let Some(rest) = name.strip_prefix("get").or_else(|| name.strip_prefix("set")) {
        rest
    } else {
        return Err(Error::reflection(format!(
            "error parsing property name '{name}'; didn't start with 'is', 'get' or 'set'"
        )));
    };

    let mut chars = stripped.chars();
    let Some(first) = chars.next() else {
        return Ok(String::new());
    };

    let second_is_upper = stripped.chars().nth(1).is_some_and(char::is_uppercase);
    if second_is_upper {
        return Ok(stripped.to_string());
    }

    let mut property = String::with_capacity(stripped.len());
    property.extend(first.to_lowercase());
    property.push_str(chars.as_str());
    Ok(property)
}

pub fn is_getter(name: &str) -> bool {
    (name.starts_with("get") && name.len() > 3) || (name.starts_with("is") && name.len() > 2)
}

pub fn is_setter(name: &str) -> bool {
    name.starts_with("set") && name.len() > 3
}

/// Names that never become properties.
pub(crate) fn is_valid_property_name(name: &str) -> bool {
    !(name.starts_with('$') || name == "serialVersionUID" || name == "class")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_indexed_segments() {
        let prop = PropertyTokenizer::new("orders[0].items.name");
        assert_eq!(prop.name(), "orders");
        assert_eq!(prop.index(), Some("0"));
        assert_eq!(prop.indexed_name(), "orders[0]");
        assert_eq!(prop.children(), Some("items.name"));

        let next = prop.next().unwrap();
        assert_eq!(next.name(), "items");
        assert_eq!(next.index(), None);
        assert_eq!(next.next().unwrap().name(), "name");
        assert!(!next.next().unwrap().has_next());
    }

    #[test]
    fn unclosed_index_is_a_parse_error() {
        let prop = PropertyTokenizer::new("a[é");
        assert_eq!(prop.name(), "a[é");
        assert_eq!(prop.index(), None);

        assert!(PropertyTokenizer::parse("a[é").unwrap_err().is_parse());
        assert!(PropertyTokenizer::parse("orders[0].items[1").unwrap_err().is_parse());
        assert_eq!(PropertyTokenizer::parse("ids[é]").unwrap().index(), Some("é"));
    }

    #[test]
    fn property_names() {
        assert_eq!(method_to_property("getFirstName").unwrap(), "firstName");
        assert_eq!(method_to_property("isActive").unwrap(), "active");
        assert_eq!(method_to_property("setId").unwrap(), "id");
        assert_eq!(method_to_property("getURL").unwrap(), "URL");
        assert!(method_to_property("fetch").is_err());
    }

    #[test]
    fn accessor_names() {
        assert!(is_getter("getX"));
        assert!(is_getter("isX"));
        assert!(!is_getter("get"));
        assert!(!is_getter("is"));
        assert!(is_setter("setX"));
        assert!(!is_setter("set"));
    }
}
