//! A small recursive-descent parser for the datashape mini-language used in
//! this workspace's tests and examples. Plays the external type library's
//! `parse(type string) -> type` role since no such crate exists on
//! the registry for this workspace to depend on (see DESIGN.md).

use crate::error::{Result, TypeBuildError};
use crate::kind::{DimLayout, PrimitiveKind, StringEncoding};
use crate::types::Type;

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

pub fn parse(src: &str) -> Result<Type> {
    let mut p = Parser { src, pos: 0 };
    let ty = p.parse_dims()?;
    p.skip_ws();
    if p.pos != p.src.len() {
        return Err(TypeBuildError::UnexpectedToken {
            found: p.src[p.pos..].to_string(),
            pos: p.pos,
        });
    }
    Ok(ty)
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && self.src.as_bytes()[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        self.skip_ws();
        let c = self.src[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, c: char) -> Result<()> {
        match self.bump() {
            Some(got) if got == c => Ok(()),
            Some(got) => Err(TypeBuildError::UnexpectedToken {
                found: got.to_string(),
                pos: self.pos,
            }),
            None => Err(TypeBuildError::UnexpectedEof),
        }
    }

    fn parse_ident(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.src[self.pos..].chars().next() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(TypeBuildError::UnexpectedEof);
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_number(&mut self) -> Result<usize> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.src[self.pos..].chars().next() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.src[start..self.pos]
            .parse()
            .map_err(|_| TypeBuildError::InvalidShape(self.src[start..self.pos].to_string()))
    }

    /// Parses a chain of `<dim> * <dim> * ... * <dtype>`.
    fn parse_dims(&mut self) -> Result<Type> {
        let optional = self.consume_question();
        self.skip_ws();

        if self.looks_like_var() {
            self.parse_ident()?; // consume "var"
            self.expect_star()?;
            let elem = self.parse_dims()?;
            let mut t = Type::new(crate::types::TypeKind::VarDim {
                layout: DimLayout::CContiguous,
                elem: Box::new(elem),
            });
            t.optional = optional;
            return Ok(t);
        }

        if self.looks_like_digit() {
            let shape = self.parse_number()?;
            self.expect_star()?;
            let elem = self.parse_dims()?;
            let mut t = Type::new(crate::types::TypeKind::FixedDim {
                shape,
                layout: DimLayout::CContiguous,
                elem: Box::new(elem),
            });
            t.optional = optional;
            return Ok(t);
        }

        let mut t = self.parse_dtype()?;
        t.optional = t.optional || optional;
        Ok(t)
    }

    fn consume_question(&mut self) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with('?') {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn looks_like_var(&self) -> bool {
        self.src[self.pos..].starts_with("var")
    }

    fn looks_like_digit(&self) -> bool {
        self.src[self.pos..]
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
    }

    fn expect_star(&mut self) -> Result<()> {
        self.expect('*')
    }

    fn parse_dtype(&mut self) -> Result<Type> {
        self.skip_ws();
        match self.peek() {
            Some('(') => self.parse_tuple(),
            Some('{') => self.parse_record(),
            _ => {
                let name = self.parse_ident()?;
                self.parse_named_dtype(&name)
            }
        }
    }

    fn parse_tuple(&mut self) -> Result<Type> {
        self.expect('(')?;
        let mut fields = Vec::new();
        self.skip_ws();
        if self.peek() != Some(')') {
            loop {
                fields.push(self.parse_dims()?);
                self.skip_ws();
                if self.peek() == Some(',') {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(')')?;
        Ok(Type::tuple(fields))
    }

    fn parse_record(&mut self) -> Result<Type> {
        self.expect('{')?;
        let mut fields = Vec::new();
        self.skip_ws();
        if self.peek() != Some('}') {
            loop {
                let name = self.parse_ident()?;
                self.expect(':')?;
                let ty = self.parse_dims()?;
                fields.push((name, ty));
                self.skip_ws();
                if self.peek() == Some(',') {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect('}')?;
        Ok(Type::record(fields))
    }

    fn parse_named_dtype(&mut self, name: &str) -> Result<Type> {
        if let Some(p) = primitive_from_name(name) {
            return Ok(Type::primitive(p));
        }
        match name {
            "string" => Ok(Type::new(crate::types::TypeKind::String)),
            "bytes" => Ok(Type::new(crate::types::TypeKind::Bytes)),
            "char" => Ok(Type::new(crate::types::TypeKind::Char)),
            "fixed_string" => self.parse_fixed_string(),
            "fixed_bytes" => self.parse_fixed_bytes(),
            other => Err(TypeBuildError::UnknownDtype(other.to_string())),
        }
    }

    fn parse_fixed_string(&mut self) -> Result<Type> {
        self.expect('[')?;
        let len = self.parse_number()?;
        self.skip_ws();
        let encoding = if self.peek() == Some(',') {
            self.bump();
            self.expect('\'')?;
            let name = self.parse_ident()?;
            self.expect('\'')?;
            encoding_from_name(&name)?
        } else {
            StringEncoding::Utf8
        };
        self.expect(']')?;
        Ok(Type::new(crate::types::TypeKind::FixedString { len, encoding }))
    }

    fn parse_fixed_bytes(&mut self) -> Result<Type> {
        self.expect('[')?;
        // size=N[, align=M]
        self.parse_ident()?; // "size"
        self.expect('=')?;
        let size = self.parse_number()?;
        self.skip_ws();
        let align = if self.peek() == Some(',') {
            self.bump();
            self.parse_ident()?; // "align"
            self.expect('=')?;
            self.parse_number()?
        } else {
            size.min(8).max(1)
        };
        self.expect(']')?;
        Ok(Type::new(crate::types::TypeKind::FixedBytes { size, align }))
    }
}

fn primitive_from_name(name: &str) -> Option<PrimitiveKind> {
    use PrimitiveKind::*;
    Some(match name {
        "bool" => Bool,
        "int8" => Int8,
        "int16" => Int16,
        "int32" => Int32,
        "int64" => Int64,
        "uint8" => Uint8,
        "uint16" => Uint16,
        "uint32" => Uint32,
        "uint64" => Uint64,
        "float16" => Float16,
        "bfloat16" => BFloat16,
        "float32" => Float32,
        "float64" => Float64,
        "complex32" => Complex32,
        "complex64" => Complex64,
        "complex128" => Complex128,
        _ => return None,
    })
}

fn encoding_from_name(name: &str) -> Result<StringEncoding> {
    Ok(match name {
        "ascii" => StringEncoding::Ascii,
        "utf8" => StringEncoding::Utf8,
        "utf16" => StringEncoding::Utf16,
        "utf32" => StringEncoding::Utf32,
        other => return Err(TypeBuildError::UnknownDtype(other.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_var_chain() {
        let t = parse("3 * ?var * ?int64").unwrap();
        assert_eq!(t.to_string(), "3 * ?var * ?int64");
    }

    #[test]
    fn parses_record() {
        let t = parse("{a: ?int64, b: ?int64, c: ?int64}").unwrap();
        assert_eq!(t.to_string(), "{a: ?int64, b: ?int64, c: ?int64}");
    }

    #[test]
    fn parses_tuple_of_primitives() {
        let t = parse("(int64, float64)").unwrap();
        assert_eq!(t.to_string(), "(int64, float64)");
    }

    #[test]
    fn rejects_unknown_dtype() {
        assert!(parse("3 * frobnicate").is_err());
    }
}
