//! writes validated (or raw) trees back out in the configuration language
//!
//! Values are written from the literal they were parsed from, so the output stays close to the
//! input (`64Mi` stays a number, `'0.0.0.0:80'` stays a string, `fast` is not replaced by the
//! value it maps to). Defaults are left out since validating the output applies them again.
use crate::literal::Literal;
use crate::raw::RawSection;
use crate::validated::ValidatedSection;
use std::fmt;

const INDENT: &str = "    ";

/// [fmt::Display] adapter writing a validated tree
pub struct Validated<'a>(pub &'a ValidatedSection);

/// [fmt::Display] adapter writing a raw tree
pub struct Raw<'a>(pub &'a RawSection);

impl fmt::Display for Validated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_validated(f, self.0, 0)
    }
}

impl fmt::Display for Raw<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_raw_body(f, self.0, 0)
    }
}

pub fn to_string(section: &ValidatedSection) -> String {
    Validated(section).to_string()
}

pub fn raw_to_string(section: &RawSection) -> String {
    Raw(section).to_string()
}

fn write_validated<W: fmt::Write>(
    out: &mut W,
    section: &ValidatedSection,
    depth: usize,
) -> fmt::Result {
    for (key, entry) in &section.values {
        if let Some(literal) = &entry.raw {
            write_assignment(out, key, literal, depth)?;
        }
    }
    for (key, literal) in &section.unknown {
        write_assignment(out, key, literal, depth)?;
    }

    for (name, instances) in &section.subsections {
        for instance in instances {
            write_header(out, name, &instance.raw_args, depth)?;
            write_validated(out, instance, depth + 1)?;
            write_footer(out, depth)?;
        }
    }
    for instances in section.unknown_sections.values() {
        for instance in instances {
            write_raw(out, instance, depth)?;
        }
    }
    Ok(())
}

fn write_raw<W: fmt::Write>(out: &mut W, section: &RawSection, depth: usize) -> fmt::Result {
    write_header(out, &section.name, &section.args, depth)?;
    write_raw_body(out, section, depth + 1)?;
    write_footer(out, depth)
}

fn write_raw_body<W: fmt::Write>(out: &mut W, section: &RawSection, depth: usize) -> fmt::Result {
    for assignment in &section.assignments {
        write_assignment(out, &assignment.key, &assignment.value, depth)?;
    }
    for child in &section.children {
        write_raw(out, child, depth)?;
    }
    Ok(())
}

fn write_assignment<W: fmt::Write>(
    out: &mut W,
    key: &str,
    literal: &Literal,
    depth: usize,
) -> fmt::Result {
    // an empty list can not be written
    if matches!(literal, Literal::List(items) if items.is_empty()) {
        return Ok(());
    }
    writeln!(out, "{}{key} = {literal}", INDENT.repeat(depth))
}

fn write_header<W: fmt::Write>(
    out: &mut W,
    name: &str,
    args: &[Literal],
    depth: usize,
) -> fmt::Result {
    write!(out, "{}{name}", INDENT.repeat(depth))?;
    for (index, arg) in args.iter().enumerate() {
        let separator = if index == 0 { " " } else { ", " };
        write!(out, "{separator}{arg}")?;
    }
    writeln!(out, " {{")
}

fn write_footer<W: fmt::Write>(out: &mut W, depth: usize) -> fmt::Result {
    writeln!(out, "{}}}", INDENT.repeat(depth))
}
