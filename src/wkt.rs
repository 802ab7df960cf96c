//! Reading polygons out of [well-known text].
//!
//! Only the two polygonal geometry types are understood, and only in two dimensions:
//!
//! ```text
//! geometry     = "POLYGON" polygon | "MULTIPOLYGON" multipolygon
//! polygon      = "(" ring { "," ring } ")"
//! ring         = "(" point { "," point } ")"
//! point        = number number
//! multipolygon = "(" polygon { "," polygon } ")"
//! ```
//!
//! Every ring needs at least three distinct points; closing it by repeating the first point is
//! allowed but not required.
//!
//! Keywords are case-insensitive and whitespace between tokens is free-form. Anything else,
//! including other (valid) geometry types, `EMPTY` geometries, and `Z`/`M` coordinates, is
//! rejected with a [`DecodeError`] that points at the offending byte.
//!
//! [`parse`] stops at planar [`GridCoordinate`]s; [`decode`] additionally runs every vertex
//! through the British National Grid to WGS84 [transform](crate::transform()).
//!
//! [well-known text]: https://en.wikipedia.org/wiki/Well-known_text_representation_of_geometry

use crate::datum::{Osgb36, Wgs84};
use crate::error::DecodeError;
use crate::geodetic::LonLat;
use crate::geometry::{Geometry, MultiPolygon, Polygon, Ring};
use crate::grid::GridCoordinate;
use crate::transform::GridTransform;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Open,
    Close,
    Comma,
    Word(&'a str),
    Number(f64),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => f.write_str("`(`"),
            Token::Close => f.write_str("`)`"),
            Token::Comma => f.write_str("`,`"),
            Token::Word(word) => write!(f, "`{word}`"),
            Token::Number(number) => write!(f, "`{number}`"),
        }
    }
}

/// Splits well-known text into tokens, each tagged with the byte offset it starts at.
///
/// Tokens are produced on demand so that a bad keyword is reported before anything after it is
/// looked at.
struct Lexer<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, offset: 0 }
    }

    /// Consumes bytes from the current offset for as long as `accept` holds.
    fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> &'a str {
        let start = self.offset;
        let len = self.text.as_bytes()[start..]
            .iter()
            .take_while(|&&b| accept(b))
            .count();
        self.offset += len;
        &self.text[start..self.offset]
    }

    fn next_token(&mut self) -> Result<Option<(usize, Token<'a>)>, DecodeError> {
        self.take_while(|b| b.is_ascii_whitespace());
        let start = self.offset;
        let Some(&byte) = self.text.as_bytes().get(start) else {
            return Ok(None);
        };

        let token = match byte {
            b'(' => {
                self.offset += 1;
                Token::Open
            }
            b')' => {
                self.offset += 1;
                Token::Close
            }
            b',' => {
                self.offset += 1;
                Token::Comma
            }
            b'0'..=b'9' | b'+' | b'-' | b'.' => {
                let literal = self.take_while(|b| {
                    b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')
                });
                let number = literal.parse::<f64>().map_err(|_| {
                    DecodeError::malformed(start, format!("`{literal}` is not a number"))
                })?;
                Token::Number(number)
            }
            b if b.is_ascii_alphabetic() => {
                Token::Word(self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_'))
            }
            _ => {
                // NOTE: slicing by char here, since the offending byte may start a multi-byte one
                let c = self.text[start..].chars().next().unwrap_or_default();
                return Err(DecodeError::malformed(
                    start,
                    format!("unexpected character `{c}`"),
                ));
            }
        };
        Ok(Some((start, token)))
    }
}

/// A recursive-descent parser over the [`Lexer`] with one token of lookahead.
struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Option<(usize, Token<'a>)>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lexer: Lexer::new(text),
            peeked: None,
        }
    }

    fn next(&mut self) -> Result<Option<(usize, Token<'a>)>, DecodeError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> Result<Option<(usize, Token<'a>)>, DecodeError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token()?);
        }
        Ok(self.peeked.flatten())
    }

    /// Offset to blame when the input ends too early.
    fn end_offset(&self) -> usize {
        self.lexer.text.len()
    }

    fn expect(&mut self, expected: Token<'static>) -> Result<usize, DecodeError> {
        match self.next()? {
            Some((offset, token)) if token == expected => Ok(offset),
            Some((offset, token)) => Err(DecodeError::malformed(
                offset,
                format!("expected {expected}, found {token}"),
            )),
            None => Err(DecodeError::malformed(
                self.end_offset(),
                format!("expected {expected}, found end of input"),
            )),
        }
    }

    /// Parses `"(" item { "," item } ")"`.
    fn delimited<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        self.open()?;
        let mut items = vec![item(self)?];
        loop {
            match self.next()? {
                Some((_, Token::Comma)) => items.push(item(self)?),
                Some((_, Token::Close)) => return Ok(items),
                Some((offset, token)) => {
                    return Err(DecodeError::malformed(
                        offset,
                        format!("expected `,` or `)`, found {token}"),
                    ))
                }
                None => {
                    return Err(DecodeError::malformed(
                        self.end_offset(),
                        "expected `,` or `)`, found end of input",
                    ))
                }
            }
        }
    }

    /// The opening parenthesis of a body, with friendlier errors for the common ways that
    /// well-known text we do not support differs from what we do.
    fn open(&mut self) -> Result<(), DecodeError> {
        if let Some((offset, Token::Word(word))) = self.peek()? {
            let reason = if word.eq_ignore_ascii_case("EMPTY") {
                "empty geometries are not supported".to_owned()
            } else if ["Z", "M", "ZM"].iter().any(|d| word.eq_ignore_ascii_case(d)) {
                format!("only 2-D coordinates are supported, found `{word}`")
            } else {
                format!("expected `(`, found `{word}`")
            };
            return Err(DecodeError::malformed(offset, reason));
        }
        self.expect(Token::Open).map(|_| ())
    }

    fn number(&mut self) -> Result<f64, DecodeError> {
        match self.next()? {
            Some((_, Token::Number(number))) => Ok(number),
            Some((offset, token)) => Err(DecodeError::malformed(
                offset,
                format!("expected a number, found {token}"),
            )),
            None => Err(DecodeError::malformed(
                self.end_offset(),
                "expected a number, found end of input",
            )),
        }
    }

    fn point(&mut self) -> Result<GridCoordinate, DecodeError> {
        let easting = self.number()?;
        let northing = self.number()?;
        if let Some((offset, Token::Number(_))) = self.peek()? {
            return Err(DecodeError::malformed(
                offset,
                "only 2-D coordinates are supported, found a third ordinate",
            ));
        }
        Ok(GridCoordinate::from_meters(easting, northing))
    }

    fn ring(&mut self) -> Result<Ring<GridCoordinate>, DecodeError> {
        let start = self.peek()?.map_or_else(|| self.end_offset(), |(offset, _)| offset);
        let points = self.delimited(Self::point)?;
        if distinct_points(&points) < 3 {
            return Err(DecodeError::malformed(start, "a ring needs at least 3 distinct points"));
        }
        Ok(Ring::new(points))
    }

    fn polygon(&mut self) -> Result<Polygon<GridCoordinate>, DecodeError> {
        let rings = self.delimited(Self::ring)?;
        // NOTE: delimited never returns an empty Vec
        Polygon::from_rings(rings)
            .ok_or_else(|| DecodeError::malformed(self.end_offset(), "polygon has no rings"))
    }

    fn multipolygon(&mut self) -> Result<MultiPolygon<GridCoordinate>, DecodeError> {
        self.delimited(Self::polygon).map(MultiPolygon::new)
    }

    fn geometry(&mut self) -> Result<Geometry<GridCoordinate>, DecodeError> {
        let geometry = match self.next()? {
            Some((_, Token::Word(keyword))) if keyword.eq_ignore_ascii_case("POLYGON") => {
                Geometry::Polygon(self.polygon()?)
            }
            Some((_, Token::Word(keyword))) if keyword.eq_ignore_ascii_case("MULTIPOLYGON") => {
                Geometry::MultiPolygon(self.multipolygon()?)
            }
            Some((_, Token::Word(keyword))) => {
                return Err(DecodeError::Unsupported {
                    keyword: keyword.to_owned(),
                })
            }
            Some((offset, token)) => {
                return Err(DecodeError::malformed(
                    offset,
                    format!("expected a geometry type, found {token}"),
                ))
            }
            None => return Err(DecodeError::malformed(0, "empty input")),
        };

        match self.next()? {
            None => Ok(geometry),
            Some((offset, token)) => Err(DecodeError::malformed(
                offset,
                format!("unexpected {token} after the end of the geometry"),
            )),
        }
    }
}

/// Counts distinct points in `points`, stopping at 3.
fn distinct_points(points: &[GridCoordinate]) -> usize {
    let mut seen: Vec<&GridCoordinate> = Vec::with_capacity(3);
    for point in points {
        if seen.len() == 3 {
            break;
        }
        if !seen.contains(&point) {
            seen.push(point);
        }
    }
    seen.len()
}

/// Parses a `POLYGON` or `MULTIPOLYGON` in well-known text into planar geometry.
///
/// Vertices are kept exactly as written, in order, and rings are neither closed nor reoriented.
///
/// ```rust
/// use natgrid::geometry::Geometry;
///
/// let square = natgrid::wkt::parse("POLYGON ((0 0, 0 10, 10 10, 10 0, 0 0))").unwrap();
/// let Geometry::Polygon(square) = square else { unreachable!() };
/// assert_eq!(square.exterior().len(), 5);
/// assert!(square.exterior().is_closed());
/// assert!(square.interiors().is_empty());
/// ```
pub fn parse(text: &str) -> Result<Geometry<GridCoordinate>, DecodeError> {
    Parser::new(text).geometry().inspect_err(|e| {
        tracing::debug!(error = %e, "rejected well-known text");
    })
}

/// Parses a `POLYGON` or `MULTIPOLYGON` of British National Grid coordinates in well-known text
/// and converts every vertex to WGS84 longitude and latitude.
///
/// This is all-or-nothing: if any part of the text fails to parse, or any vertex fails to
/// transform, the whole call fails and no partial geometry is returned.
///
/// ```rust
/// use natgrid::geometry::Geometry;
///
/// let area = natgrid::decode("POLYGON((0 0,0 10,10 10,10 0,0 0))").unwrap();
/// let Geometry::Polygon(area) = area else { unreachable!() };
/// let ring = area.exterior();
/// assert_eq!(ring.len(), 5);
/// assert_eq!(ring.points().first(), ring.points().last());
///
/// // longitude first
/// assert!((ring.points()[0].longitude - -7.557).abs() < 0.001);
/// assert!((ring.points()[0].latitude - 49.767).abs() < 0.001);
///
/// assert!(matches!(
///     natgrid::decode("POINT(0 0)"),
///     Err(natgrid::DecodeError::Unsupported { .. })
/// ));
/// ```
pub fn decode(text: &str) -> Result<Geometry<LonLat>, DecodeError> {
    GridTransform::<Osgb36, Wgs84>::default().decode(text)
}
