// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal line based preprocessor for WGSL.
//!
//! Supports `#ifdef NAME`, `#ifndef NAME`, `#else` and `#endif`. Directives must be the
//! first non-whitespace item on their line. Malformed input is reported through
//! `log::warn!` and otherwise tolerated.

use std::collections::HashSet;

struct StackItem {
    active: bool,
    else_passed: bool,
}

/// Returns `input` with the inactive conditional blocks and all directive lines removed.
pub fn preprocess(input: &str, shader_name: &str, defines: &HashSet<String>) -> String {
    let mut output = String::with_capacity(input.len());
    let mut stack: Vec<StackItem> = vec![];
    for (line_number, line) in input.lines().enumerate() {
        let hash_index = line.find('#');
        let comment_index = line.find("//");
        let hash_index = match (hash_index, comment_index) {
            (Some(hash_index), None) => Some(hash_index),
            (Some(hash_index), Some(comment_index)) if hash_index < comment_index => {
                Some(hash_index)
            }
            _ => None,
        };
        if let Some(hash_index) = hash_index {
            let directive_start = &line[hash_index + '#'.len_utf8()..];
            let directive_len = directive_start
                .find(|c: char| !c.is_alphanumeric())
                .unwrap_or(directive_start.len());
            let directive = &directive_start[..directive_len];
            let remainder = directive_start[directive_len..].trim();
            let directive_is_at_start = line.trim_start().starts_with('#');

            match directive {
                item @ ("ifdef" | "ifndef" | "else" | "endif") if !directive_is_at_start => {
                    log::warn!(
                        "#{item} directives must be the first non_whitespace items on \
                         their line, ignoring (line {line_number} of {shader_name}.wgsl)"
                    );
                }
                def_test @ ("ifdef" | "ifndef") => {
                    let exists = defines.contains(remainder);
                    stack.push(StackItem {
                        active: (def_test == "ifdef") == exists,
                        else_passed: false,
                    });
                    continue;
                }
                "else" => {
                    if let Some(item) = stack.last_mut() {
                        if item.else_passed {
                            log::warn!(
                                "Second else for same ifdef/ifndef (line {line_number} of \
                                 {shader_name}.wgsl); ignoring second else"
                            );
                        } else {
                            item.else_passed = true;
                            item.active = !item.active;
                        }
                    } else {
                        log::warn!("Mismatched else (line {line_number} of {shader_name}.wgsl)");
                    }
                    if !remainder.is_empty() {
                        log::warn!(
                            "#else directives don't take an argument. `{remainder}` will not \
                             be in output (line {line_number} of {shader_name}.wgsl)"
                        );
                    }
                    continue;
                }
                "endif" => {
                    if stack.pop().is_none() {
                        log::warn!("Mismatched endif (line {line_number} of {shader_name}.wgsl)");
                    }
                    if !remainder.is_empty() && !remainder.starts_with("//") {
                        log::warn!(
                            "#endif directives don't take an argument. `{remainder}` will \
                             not be in output (line {line_number} of {shader_name}.wgsl)"
                        );
                    }
                    continue;
                }
                val => {
                    log::warn!(
                        "Unknown preprocessor directive `{val}` (line {line_number} of \
                         {shader_name}.wgsl)"
                    );
                }
            }
        }
        if stack.iter().all(|item| item.active) {
            output.push_str(line);
            output.push('\n');
        }
    }
    if !stack.is_empty() {
        log::warn!("{} unterminated ifdef/ifndef in {shader_name}.wgsl", stack.len());
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
a
#ifdef FOO
b
#else
c
#endif
#ifndef FOO
d
#endif // FOO
e
";

    fn defines(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn selects_branches() {
        assert_eq!(preprocess(SOURCE, "test", &defines(&[])), "a\nc\nd\ne\n");
        assert_eq!(preprocess(SOURCE, "test", &defines(&["FOO"])), "a\nb\ne\n");
    }

    #[test]
    fn nested_blocks() {
        let source = "#ifdef A\n#ifdef B\nab\n#else\na\n#endif\n#endif\n";
        assert_eq!(preprocess(source, "test", &defines(&["A", "B"])), "ab\n");
        assert_eq!(preprocess(source, "test", &defines(&["A"])), "a\n");
        assert_eq!(preprocess(source, "test", &defines(&["B"])), "");
    }

    #[test]
    fn ignores_commented_and_inline_directives() {
        let source = "// #ifdef FOO\nx // #endif\nlet y = 1; #ifdef FOO\n";
        assert_eq!(preprocess(source, "test", &defines(&[])), source);
    }

    #[test]
    fn tolerates_mismatched_endif() {
        assert_eq!(preprocess("#endif\nx\n", "test", &defines(&[])), "x\n");
    }
}
