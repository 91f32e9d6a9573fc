//! ZMK devicetree import.
//!
//! Reads the subset of devicetree needed to recover a physical layout:
//!
//! ```text
//! keys = <&key_physical_attrs 100 100    0    0       0     0     0>
//!      , <&key_physical_attrs 100 100  100    0   (-1500)   100     0>
//!      ;
//! ...
//! bindings = <&kp ESC &mt LSHIFT A>;
//! ```
//!
//! # Format
//!
//! - Each `<&key_physical_attrs w h x y rot rx ry>` tuple is one key; the
//!   fields are hundredths of a unit (hundredths of a degree for `rot`),
//!   negatives wrapped in parentheses
//! - The keymap's first `bindings` list supplies one binding per key, in the
//!   same order: a word starting with `&` opens a binding and the words that
//!   follow are its arguments
//! - `&kp <code>` bindings give the key the legend `<code>`; any other
//!   binding is used verbatim as the legend
//!
//! Only geometry and the primary legend are recovered.

use tracing::debug;

use crate::models::{primary_labels, KeyLayout, Labels, Point, KEY_PRESS_BEHAVIOR};
use crate::parser::error::{fragment, ImportError};

/// Behavior node referenced by every physical key tuple.
pub const KEY_PHYSICAL_ATTRS: &str = "&key_physical_attrs";

/// Number of fields in a physical key tuple.
pub const ATTRS_FIELD_COUNT: usize = 7;

const KEYMAP_COMPATIBLE: &str = "zmk,keymap";

/// Parses ZMK devicetree text into keys, one per attrs tuple.
///
/// Without any `bindings` property the keys are imported without legends
/// or bindings.
pub fn import_zmk(text: &str) -> Result<Vec<KeyLayout>, ImportError> {
    let tokens = Lexer::new(text).tokenize()?;

    let attrs = physical_attrs(text, &tokens)?;
    if attrs.is_empty() {
        return Err(ImportError::ZmkLayoutNotFound);
    }

    let bindings = keymap_bindings(text, &tokens)?;
    if let Some(bindings) = &bindings {
        if bindings.len() != attrs.len() {
            return Err(ImportError::ZmkBindingCountMismatch {
                keys: attrs.len(),
                bindings: bindings.len(),
            });
        }
    } else {
        debug!("No bindings property found; importing geometry only");
    }

    let keys: Vec<KeyLayout> = attrs
        .iter()
        .enumerate()
        .map(|(index, attrs)| {
            let binding = bindings.as_ref().map(|bindings| bindings[index].clone());
            let labels = binding
                .as_deref()
                .map(|binding| primary_labels(binding_legend(binding)))
                .unwrap_or_default();
            attrs.to_key(labels, binding)
        })
        .collect();

    debug!(
        keys = keys.len(),
        with_bindings = bindings.is_some(),
        "Imported ZMK layout"
    );
    Ok(keys)
}

/// Legend shown for a binding: everything after `&kp` (which may span
/// several words), otherwise the whole binding.
#[must_use]
pub fn binding_legend(binding: &str) -> &str {
    let binding = binding.trim();
    match binding.strip_prefix(KEY_PRESS_BEHAVIOR) {
        Some(code) if code.starts_with(char::is_whitespace) && !code.trim().is_empty() => {
            code.trim()
        }
        _ => binding,
    }
}

/// Decoded `<&key_physical_attrs ...>` tuple in units.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PhysicalAttrs {
    w: f64,
    h: f64,
    x: f64,
    y: f64,
    rotation: f64,
    rx: f64,
    ry: f64,
}

impl PhysicalAttrs {
    fn parse(fields: &[&str], source: &str) -> Result<Self, ImportError> {
        if fields.len() < ATTRS_FIELD_COUNT {
            return Err(ImportError::ZmkInvalidKey {
                fragment: fragment(source),
            });
        }

        let mut values = [0.0; ATTRS_FIELD_COUNT];
        for (slot, raw) in values.iter_mut().zip(fields) {
            *slot = parse_fixed_point(raw, source)?;
        }
        let [w, h, x, y, rotation, rx, ry] = values;

        Ok(Self {
            w,
            h,
            x,
            y,
            rotation,
            rx,
            ry,
        })
    }

    fn to_key(self, labels: Labels, binding: Option<String>) -> KeyLayout {
        let mut key = KeyLayout::new(self.x, self.y)
            .with_size(self.w, self.h)
            .with_rotation(self.rotation, Point::new(self.rx, self.ry))
            .with_labels(labels);
        key.binding = binding;
        key
    }
}

/// Parses one fixed-point field, e.g. `150` or `(-25)`.
fn parse_fixed_point(raw: &str, source: &str) -> Result<f64, ImportError> {
    let cleaned = raw.replace(['(', ')'], "");
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value / 100.0),
        _ => Err(ImportError::ZmkInvalidNumber {
            value: raw.to_string(),
            fragment: fragment(source),
        }),
    }
}

/// Collects every attrs tuple in document order.
fn physical_attrs(text: &str, tokens: &[Token<'_>]) -> Result<Vec<PhysicalAttrs>, ImportError> {
    let mut attrs = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        let open = tokens[index];
        let starts_tuple = open.kind == TokenKind::Open
            && tokens
                .get(index + 1)
                .is_some_and(|next| next.kind == TokenKind::Word(KEY_PHYSICAL_ATTRS));
        if !starts_tuple {
            index += 1;
            continue;
        }

        let mut fields = Vec::new();
        let mut cursor = index + 2;
        let close = loop {
            let Some(token) = tokens.get(cursor) else {
                return Err(ImportError::ZmkUnterminated {
                    what: "key definition",
                    fragment: fragment(&text[open.start..]),
                });
            };
            match token.kind {
                TokenKind::Close => break *token,
                TokenKind::Word(word) => fields.push(word),
                _ => {
                    return Err(ImportError::ZmkInvalidKey {
                        fragment: fragment(&text[open.start..token.end]),
                    })
                }
            }
            cursor += 1;
        };

        attrs.push(PhysicalAttrs::parse(&fields, &text[open.start..close.end])?);
        index = cursor + 1;
    }

    Ok(attrs)
}

/// Bindings of the first `bindings = <...>` list, preferring the keymap node.
///
/// Behavior definitions (hold-taps, tap-dances) also carry a `bindings`
/// property; when the text declares a `zmk,keymap` node only the bindings
/// after it are considered.
fn keymap_bindings(text: &str, tokens: &[Token<'_>]) -> Result<Option<Vec<String>>, ImportError> {
    let keymap_start = tokens
        .windows(3)
        .position(|window| {
            window[0].kind == TokenKind::Word("compatible")
                && window[1].kind == TokenKind::Equals
                && window[2].kind == TokenKind::Str(KEYMAP_COMPATIBLE)
        });

    let find_from = |from: usize| {
        tokens[from..]
            .windows(3)
            .position(is_bindings_property)
            .map(|offset| from + offset)
    };
    let Some(start) = find_from(keymap_start.unwrap_or(0)) else {
        return Ok(None);
    };

    let open = tokens[start + 2];
    let mut words = Vec::new();
    let mut closed = false;
    for token in &tokens[start + 3..] {
        match token.kind {
            TokenKind::Close => {
                closed = true;
                break;
            }
            TokenKind::Word(word) => words.push(word),
            _ => {}
        }
    }
    if !closed {
        return Err(ImportError::ZmkUnterminated {
            what: "bindings list",
            fragment: fragment(&text[open.start..]),
        });
    }

    Ok(Some(group_bindings(&words)))
}

fn is_bindings_property(window: &[Token<'_>]) -> bool {
    window[0].kind == TokenKind::Word("bindings")
        && window[1].kind == TokenKind::Equals
        && window[2].kind == TokenKind::Open
}

/// Groups words into bindings: `&` opens a binding, other words are arguments.
fn group_bindings(words: &[&str]) -> Vec<String> {
    let mut bindings: Vec<String> = Vec::new();
    for word in words {
        if word.starts_with('&') {
            bindings.push((*word).to_string());
        } else if let Some(binding) = bindings.last_mut() {
            binding.push(' ');
            binding.push_str(word);
        }
    }
    bindings
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind<'a> {
    /// `<`
    Open,
    /// `>`
    Close,
    Semicolon,
    Equals,
    Comma,
    LeftBrace,
    RightBrace,
    /// Quoted string, without the quotes
    Str(&'a str),
    /// Anything else up to whitespace or punctuation (`&kp`, `100`, `(-25)`)
    Word(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token<'a> {
    kind: TokenKind<'a>,
    /// Byte offset of the first character
    start: usize,
    /// Byte offset past the last character
    end: usize,
}

/// Devicetree tokenizer; comments are skipped.
struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn tokenize(mut self) -> Result<Vec<Token<'a>>, ImportError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, ImportError> {
        self.skip_trivia()?;

        let start = self.pos;
        let Some(c) = self.source[start..].chars().next() else {
            return Ok(None);
        };

        let kind = match c {
            '<' => TokenKind::Open,
            '>' => TokenKind::Close,
            ';' => TokenKind::Semicolon,
            '=' => TokenKind::Equals,
            ',' => TokenKind::Comma,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '"' => return self.string(start).map(Some),
            _ => return Ok(Some(self.word(start))),
        };
        self.pos += c.len_utf8();

        Ok(Some(Token {
            kind,
            start,
            end: self.pos,
        }))
    }

    /// Skips whitespace, `// line` and `/* block */` comments.
    fn skip_trivia(&mut self) -> Result<(), ImportError> {
        loop {
            let rest = &self.source[self.pos..];
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                let Some(end) = body.find("*/") else {
                    return Err(ImportError::ZmkUnterminated {
                        what: "comment",
                        fragment: fragment(trimmed),
                    });
                };
                self.pos += 2 + end + 2;
            } else {
                return Ok(());
            }
        }
    }

    fn string(&mut self, start: usize) -> Result<Token<'a>, ImportError> {
        let bytes = self.source.as_bytes();
        let mut index = start + 1;
        while index < bytes.len() {
            match bytes[index] {
                b'\\' => index += 2,
                b'"' => {
                    self.pos = index + 1;
                    return Ok(Token {
                        kind: TokenKind::Str(&self.source[start + 1..index]),
                        start,
                        end: self.pos,
                    });
                }
                _ => index += 1,
            }
        }
        Err(ImportError::ZmkUnterminated {
            what: "string",
            fragment: fragment(&self.source[start..]),
        })
    }

    fn word(&mut self, start: usize) -> Token<'a> {
        let rest = &self.source[start..];
        let len = rest
            .char_indices()
            .find(|&(index, c)| {
                c.is_whitespace()
                    || matches!(c, '<' | '>' | ';' | '=' | ',' | '{' | '}' | '"')
                    || rest[index..].starts_with("//")
                    || rest[index..].starts_with("/*")
            })
            .map_or(rest.len(), |(index, _)| index);

        self.pos = start + len;
        Token {
            kind: TokenKind::Word(&rest[..len]),
            start,
            end: self.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_KEYS: &str = r#"
/ {
    imported_layout: imported_layout {
        compatible = "zmk,physical-layout";
        keys  //                     w   h    x    y     rot    rx    ry
            = <&key_physical_attrs 100 100    0    0       0     0     0>
            , <&key_physical_attrs 150 100  100  (-25)  1500   100  (-50)>
            ;
    };
    keymap {
        compatible = "zmk,keymap";
        default_layer {
            bindings = <
                &kp ESC
                &mt LSHIFT A
            >;
        };
    };
};
"#;

    fn kinds(text: &str) -> Vec<TokenKind<'_>> {
        Lexer::new(text)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_lexer_tokens() {
        assert_eq!(
            kinds(r#"a = <1 (-2)>; /* c */ s = "x;y"; // tail"#),
            vec![
                TokenKind::Word("a"),
                TokenKind::Equals,
                TokenKind::Open,
                TokenKind::Word("1"),
                TokenKind::Word("(-2)"),
                TokenKind::Close,
                TokenKind::Semicolon,
                TokenKind::Word("s"),
                TokenKind::Equals,
                TokenKind::Str("x;y"),
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_lexer_root_node_and_labels() {
        assert_eq!(
            kinds("/ { node: node {}; };"),
            vec![
                TokenKind::Word("/"),
                TokenKind::LeftBrace,
                TokenKind::Word("node:"),
                TokenKind::Word("node"),
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Semicolon,
                TokenKind::RightBrace,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_lexer_word_stops_at_comment() {
        assert_eq!(kinds("abc//x"), vec![TokenKind::Word("abc")]);
    }

    #[test]
    fn test_import_two_keys() {
        let keys = import_zmk(TWO_KEYS).unwrap();
        assert_eq!(keys.len(), 2);

        let first = &keys[0];
        assert_eq!((first.x, first.y, first.w, first.h), (0.0, 0.0, 1.0, 1.0));
        assert_eq!(first.primary_label(), "ESC");
        assert_eq!(first.binding.as_deref(), Some("&kp ESC"));

        let second = &keys[1];
        assert_eq!(second.w, 1.5);
        assert_eq!(second.x, 1.0);
        assert_eq!(second.y, -0.25);
        assert_eq!(second.rotation_angle, 15.0);
        assert_eq!(second.rotation_center, Point::new(1.0, -0.5));
        assert_eq!(second.primary_label(), "&mt LSHIFT A");
        assert_eq!(second.binding.as_deref(), Some("&mt LSHIFT A"));
    }

    #[test]
    fn test_keys_get_fresh_ids() {
        let keys = import_zmk(TWO_KEYS).unwrap();
        assert_ne!(keys[0].id, keys[1].id);
    }

    #[test]
    fn test_commented_out_keys_are_ignored() {
        let text = "/* <&key_physical_attrs 1 1 1 1 1 1 1> */\n\
                    // <&key_physical_attrs 2 2 2 2 2 2 2>\n\
                    keys = <&key_physical_attrs 100 100 0 0 0 0 0>;";
        let keys = import_zmk(text).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].w, 1.0);
    }

    #[test]
    fn test_missing_layout() {
        assert_eq!(
            import_zmk("/ { keymap { }; };"),
            Err(ImportError::ZmkLayoutNotFound)
        );
    }

    #[test]
    fn test_too_few_fields() {
        let err = import_zmk("keys = <&key_physical_attrs 100 100 0>;").unwrap_err();
        assert_eq!(
            err,
            ImportError::ZmkInvalidKey {
                fragment: "<&key_physical_attrs 100 100 0>".to_string()
            }
        );
    }

    #[test]
    fn test_unexpected_token_in_tuple() {
        let err = import_zmk("keys = <&key_physical_attrs 100 100 0; 0 0 0 0>;").unwrap_err();
        assert!(matches!(err, ImportError::ZmkInvalidKey { .. }));
    }

    #[test]
    fn test_non_numeric_field() {
        let err = import_zmk("keys = <&key_physical_attrs 100 abc 0 0 0 0 0>;").unwrap_err();
        match err {
            ImportError::ZmkInvalidNumber { value, fragment } => {
                assert_eq!(value, "abc");
                assert!(fragment.contains("&key_physical_attrs 100 abc"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_tuple() {
        let err = import_zmk("keys = <&key_physical_attrs 100 100 0 0").unwrap_err();
        assert!(matches!(
            err,
            ImportError::ZmkUnterminated {
                what: "key definition",
                ..
            }
        ));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = import_zmk("keys = <&key_physical_attrs 100 100 0 0 0 0 0>; /* open").unwrap_err();
        assert!(matches!(err, ImportError::ZmkUnterminated { what: "comment", .. }));
    }

    #[test]
    fn test_unterminated_bindings() {
        let text = "keys = <&key_physical_attrs 100 100 0 0 0 0 0>; bindings = <&kp A";
        let err = import_zmk(text).unwrap_err();
        assert!(matches!(
            err,
            ImportError::ZmkUnterminated {
                what: "bindings list",
                ..
            }
        ));
    }

    #[test]
    fn test_binding_count_mismatch() {
        let text = "keys = <&key_physical_attrs 100 100 0 0 0 0 0>\n\
                    , <&key_physical_attrs 100 100 100 0 0 0 0>;\n\
                    bindings = <&kp A>;";
        assert_eq!(
            import_zmk(text),
            Err(ImportError::ZmkBindingCountMismatch {
                keys: 2,
                bindings: 1
            })
        );
    }

    #[test]
    fn test_geometry_only_file() {
        let keys = import_zmk("keys = <&key_physical_attrs 200 100 0 0 0 0 0>;").unwrap();
        assert_eq!(keys[0].w, 2.0);
        assert!(keys[0].labels.iter().all(String::is_empty));
        assert!(keys[0].binding.is_none());
    }

    #[test]
    fn test_words_before_first_binding_are_ignored() {
        let text = "keys = <&key_physical_attrs 100 100 0 0 0 0 0>; bindings = <junk &kp Q>;";
        let keys = import_zmk(text).unwrap();
        assert_eq!(keys[0].binding.as_deref(), Some("&kp Q"));
    }

    #[test]
    fn test_keymap_bindings_preferred_over_behaviors() {
        let text = r#"
            hm: homerow_mods { compatible = "zmk,behavior-hold-tap"; bindings = <&kp>, <&kp>; };
            layout { keys = <&key_physical_attrs 100 100 0 0 0 0 0>; };
            keymap { compatible = "zmk,keymap"; base { bindings = <&kp Z>; }; };
        "#;
        let keys = import_zmk(text).unwrap();
        assert_eq!(keys[0].primary_label(), "Z");
    }

    #[test]
    fn test_binding_legend() {
        assert_eq!(binding_legend("&kp A"), "A");
        assert_eq!(binding_legend("&kp"), "&kp");
        assert_eq!(binding_legend("&mo 1"), "&mo 1");
        assert_eq!(binding_legend("&trans"), "&trans");
        assert_eq!(binding_legend("&kpx A"), "&kpx A");
        assert_eq!(binding_legend(" &kp Caps Lock "), "Caps Lock");
    }

    #[test]
    fn test_keymap_without_bindings_ignores_behaviors() {
        let text = r#"
            ht: hold_tap { compatible = "zmk,behavior-hold-tap"; bindings = <&kp>, <&kp>; };
            layout { keys = <&key_physical_attrs 100 100 0 0 0 0 0>; };
            keymap { compatible = "zmk,keymap"; };
        "#;
        let keys = import_zmk(text).unwrap();
        assert!(keys[0].binding.is_none());
        assert_eq!(keys[0].primary_label(), "");
    }

    #[test]
    fn test_multi_word_kp_legend() {
        let text = "keys = <&key_physical_attrs 100 100 0 0 0 0 0>; bindings = <&kp Caps Lock>;";
        let keys = import_zmk(text).unwrap();
        assert_eq!(keys[0].binding.as_deref(), Some("&kp Caps Lock"));
        assert_eq!(keys[0].primary_label(), "Caps Lock");
    }
}
