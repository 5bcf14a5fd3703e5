// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use source_positions::char_offset;
use source_positions::Offset;
use source_positions::PositionedSubstring;
use source_positions::SpanCalculator;

fn check_column_offsets(line: &str) {
    let offsets = Offset::all_chars(line).collect::<Vec<_>>();
    assert!(!offsets.is_empty());
    assert_eq!(offsets.first().unwrap().utf8_offset, 0);
    assert_eq!(offsets.first().unwrap().utf16_offset, 0);
    assert_eq!(offsets.first().unwrap().char_offset, 0);
    assert_eq!(offsets.last().unwrap().utf8_offset, line.len());
    assert_eq!(
        offsets.last().unwrap().utf16_offset,
        line.encode_utf16().count()
    );
    assert_eq!(offsets.last().unwrap().char_offset, line.chars().count());
    for (index, (utf8_offset, _)) in line.char_indices().enumerate() {
        let prefix = &line[0..utf8_offset];
        let utf16_offset = prefix.encode_utf16().count();
        assert_eq!(offsets[index].utf8_offset, utf8_offset);
        assert_eq!(offsets[index].utf16_offset, utf16_offset);
        assert_eq!(offsets[index].char_offset, prefix.chars().count());
    }
}

#[test]
fn can_calculate_column_offsets() {
    check_column_offsets("from a import *");
    check_column_offsets("naïve = blasé('ärgernis')");
    check_column_offsets("print('✨✨✨', d)");
}

#[test]
fn can_translate_byte_columns_to_scalar_columns() {
    // ASCII lines take the fast path; the byte column is the scalar column.
    assert_eq!(char_offset("var = 12", 6), 6);
    // 'ä' is two bytes in UTF-8 but one scalar.
    let line = "ärgernis = wert";
    let byte_column = line.find("wert").unwrap();
    assert_eq!(char_offset(line, byte_column), 11);
    // Translating back to bytes recovers the parser-reported column.
    let scalar_column = char_offset(line, byte_column);
    let roundtripped: usize = line.chars().take(scalar_column).map(char::len_utf8).sum();
    assert_eq!(roundtripped, byte_column);
}

#[test]
fn can_iterate_lines() {
    let file = "a = 1\nb = a\n\nc = b";
    let lines = PositionedSubstring::lines_iter(file).collect::<Vec<_>>();
    assert_eq!(
        lines.iter().map(|line| line.content).collect::<Vec<_>>(),
        vec!["a = 1", "b = a", "", "c = b"],
    );
    assert_eq!(lines[1].utf8_bounds, 6..11);
    assert_eq!(lines[3].utf8_bounds, 13..18);
}

#[test]
fn can_trim_whitespace() {
    let file = "    value = 0   ";
    let mut line = PositionedSubstring::from_line(file, 0);
    line.trim_whitespace();
    assert_eq!(line.content, "value = 0");
    assert_eq!(line.utf8_bounds, 4..13);
}

#[test]
fn can_calculate_positions() {
    let file = "x = 1\nnaïve = x  \n";
    let mut calculator = SpanCalculator::new(file);
    let position = calculator.for_line_and_column(1, 6, "naïve = ".len());
    assert_eq!(position.line, 1);
    assert_eq!(position.column.utf8_offset, 9);
    assert_eq!(position.column.char_offset, 8);
    assert_eq!(position.containing_line, 6..18);
    assert_eq!(position.trimmed_line, 6..16);
}
