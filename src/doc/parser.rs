//! Nom-based doc-comment parser
//!
//! ```text
//! /**           strip delimiters and leading `*`
//!  * Summary.   ──► summary (to first blank line or line ending in '.')
//!  *
//!  * Details.   ──► description
//!  *
//!  * @tag ...   ──► one chunk per tag, continuation lines folded in
//!  */
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, char, multispace0, multispace1},
    combinator::{map, opt, recognize, verify},
    error::{Error as NomError, ErrorKind},
    multi::many0,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use super::{
    DocBlock, DocTag, MethodTag, MethodTagParam, ParamTag, PropertyAccess, PropertyTag, TypeTag,
    VarTag,
};

// ============================================================================
// Public API
// ============================================================================

/// Parse a raw doc comment
pub fn parse_doc_block(raw: &str) -> DocBlock {
    let text = clean_comment(raw);
    let (body, chunks) = split_tags(&text);
    let (summary, description) = split_summary(&body);
    let tags = chunks.iter().map(|chunk| parse_tag(chunk)).collect();
    DocBlock {
        summary,
        description,
        tags,
    }
}

// ============================================================================
// Comment layout
// ============================================================================

fn clean_comment(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed.strip_prefix("/**").unwrap_or(trimmed);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);
    inner
        .lines()
        .map(|line| {
            let line = line.trim_start();
            let line = match line.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            };
            line.trim_end()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn starts_tag(line: &str) -> bool {
    let mut chars = line.trim_start().chars();
    chars.next() == Some('@') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Split the cleaned text into the free-text body and one string per tag
fn split_tags(text: &str) -> (String, Vec<String>) {
    let mut body = Vec::new();
    let mut chunks: Vec<String> = Vec::new();
    for line in text.lines() {
        if starts_tag(line) {
            chunks.push(line.trim().to_string());
        } else if let Some(current) = chunks.last_mut() {
            current.push('\n');
            current.push_str(line);
        } else {
            body.push(line);
        }
    }
    (body.join("\n").trim().to_string(), chunks)
}

fn split_summary(body: &str) -> (String, String) {
    let lines: Vec<&str> = body.lines().collect();
    let mut end = lines.len();
    for (i, line) in lines.iter().enumerate() {
        let next_blank = lines.get(i + 1).is_some_and(|l| l.trim().is_empty());
        if line.trim().is_empty() {
            end = i;
            break;
        }
        if line.trim_end().ends_with('.') || next_blank {
            end = i + 1;
            break;
        }
    }
    let summary = lines[..end].join("\n").trim().to_string();
    let description = lines[end..].join("\n").trim().to_string();
    (summary, description)
}

// ============================================================================
// Tags
// ============================================================================

fn parse_tag(chunk: &str) -> DocTag {
    let Ok((rest, name)) = tag_name(chunk) else {
        return DocTag::Other {
            name: String::new(),
            value: chunk.to_string(),
        };
    };
    let rest = rest.trim();
    let parsed = match name.to_ascii_lowercase().as_str() {
        "param" => param_tag(rest).ok().map(|(_, t)| DocTag::Param(t)),
        "return" | "returns" => type_tag(rest).ok().map(|(_, t)| DocTag::Return(t)),
        "throws" | "throw" => type_tag(rest).ok().map(|(_, t)| DocTag::Throws(t)),
        "var" => var_tag(rest).ok().map(|(_, t)| DocTag::Var(t)),
        "property" => property_tag(rest, PropertyAccess::ReadWrite),
        "property-read" => property_tag(rest, PropertyAccess::Read),
        "property-write" => property_tag(rest, PropertyAccess::Write),
        "method" => method_tag(rest).ok().map(|(_, t)| DocTag::Method(t)),
        "deprecated" => Some(DocTag::Deprecated {
            description: non_empty(rest),
        }),
        _ => None,
    };
    parsed.unwrap_or_else(|| DocTag::Other {
        name: name.to_string(),
        value: rest.to_string(),
    })
}

fn tag_name(input: &str) -> IResult<&str, &str> {
    preceded(
        char('@'),
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'),
    )(input)
}

fn param_tag(input: &str) -> IResult<&str, ParamTag> {
    let (input, type_hint) = opt(terminated(type_token, multispace1))(input)?;
    let (input, (by_ref, is_variadic, name)) = variable(input)?;
    Ok((
        "",
        ParamTag {
            type_hint: type_hint.map(str::to_string),
            name,
            description: non_empty(input),
            is_variadic,
            by_ref,
        },
    ))
}

fn type_tag(input: &str) -> IResult<&str, TypeTag> {
    let (input, type_hint) = type_token(input)?;
    Ok((
        "",
        TypeTag {
            type_hint: type_hint.to_string(),
            description: non_empty(input),
        },
    ))
}

fn var_tag(input: &str) -> IResult<&str, VarTag> {
    let (input, type_hint) = opt(type_token)(input)?;
    let (input, var) = opt(preceded(multispace0, variable))(input)?;
    Ok((
        "",
        VarTag {
            type_hint: type_hint.map(str::to_string),
            name: var.map(|(_, _, name)| name),
            description: non_empty(input),
        },
    ))
}

fn property_tag(input: &str, access: PropertyAccess) -> Option<DocTag> {
    let (_, tag) = param_tag(input).ok()?;
    Some(DocTag::Property(PropertyTag {
        access,
        type_hint: tag.type_hint,
        name: tag.name,
        description: tag.description,
    }))
}

fn method_tag(input: &str) -> IResult<&str, MethodTag> {
    let (input, is_static) = opt(terminated(tag("static"), multispace1))(input)?;
    let (input, (return_type, (name, params))) = alt((
        map(signature, |sig| (None, sig)),
        map(
            pair(type_token, preceded(multispace1, signature)),
            |(t, sig)| (Some(t), sig),
        ),
    ))(input)?;
    Ok((
        "",
        MethodTag {
            is_static: is_static.is_some(),
            return_type: return_type.map(str::to_string),
            name,
            params,
            description: non_empty(input),
        },
    ))
}

// ============================================================================
// Building blocks
// ============================================================================

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// `&...$name` → (by_ref, variadic, name)
fn variable(input: &str) -> IResult<&str, (bool, bool, String)> {
    let (input, (by_ref, variadic, _, name)) =
        tuple((opt(char('&')), opt(tag("...")), char('$'), identifier))(input)?;
    Ok((input, (by_ref.is_some(), variadic.is_some(), name.to_string())))
}

/// A type expression; whitespace is allowed inside brackets and around `|`
fn type_expr(input: &str) -> IResult<&str, &str> {
    let bytes: Vec<char> = input.chars().collect();
    let mut depth = 0i32;
    let mut end = input.len();
    let mut prev = '\0';
    for (pos, (i, c)) in input.char_indices().enumerate() {
        match c {
            '<' | '(' | '{' | '[' => depth += 1,
            '>' | ')' | '}' | ']' if prev != '=' => depth -= 1,
            c if c.is_whitespace() && depth <= 0 => {
                let next = bytes[pos..].iter().find(|ch| !ch.is_whitespace());
                let joins = matches!(prev, ':' | '|' | ',') || next == Some(&'|');
                if !joins {
                    end = i;
                    break;
                }
            }
            _ => {}
        }
        if !c.is_whitespace() {
            prev = c;
        }
    }
    let token = input[..end].trim_end();
    if token.is_empty() {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::TakeWhile1)));
    }
    Ok((&input[token.len()..], token))
}

fn type_token(input: &str) -> IResult<&str, &str> {
    verify(type_expr, |t: &str| {
        !t.starts_with('$') && !t.starts_with('&') && !t.starts_with("...")
    })(input)
}

/// `name(params)`
fn signature(input: &str) -> IResult<&str, (String, Vec<MethodTagParam>)> {
    let (input, name) = identifier(input)?;
    let (input, _) = char('(')(input)?;
    let (input, inner) = until_close_paren(input)?;
    let (input, _) = char(')')(input)?;
    let params = split_top_level(inner)
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| method_param(p.trim()))
        .collect();
    Ok((input, (name.to_string(), params)))
}

fn until_close_paren(input: &str) -> IResult<&str, &str> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[' | '{' | '<') => depth += 1,
            (None, ')') if depth == 0 => return Ok((&input[i..], &input[..i])),
            (None, ')' | ']' | '}' | '>') => depth -= 1,
            _ => {}
        }
    }
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)))
}

fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[' | '{' | '<') => depth += 1,
            (None, ')' | ']' | '}' | '>') => depth -= 1,
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn method_param(input: &str) -> MethodTagParam {
    let parsed: IResult<&str, _> = tuple((
        opt(terminated(type_token, multispace1)),
        variable,
        opt(preceded(tuple((multispace0, char('='), multispace0)), rest_str)),
    ))(input);
    match parsed {
        Ok((_, (type_hint, (by_ref, is_variadic, name), default))) => MethodTagParam {
            type_hint: type_hint.map(str::to_string),
            name,
            default: default.and_then(non_empty),
            is_variadic,
            by_ref,
        },
        Err(_) => MethodTagParam {
            type_hint: non_empty(input),
            name: String::new(),
            default: None,
            is_variadic: false,
            by_ref: false,
        },
    }
}

fn rest_str(input: &str) -> IResult<&str, &str> {
    Ok(("", input))
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
