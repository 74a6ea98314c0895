// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## بخش اول\n\nParagraph with some **bold** content and `code`.\n\nمتن فارسی با یک [پیوند](https://example.com) در میان.\n\n- Bullet point\n  - Nested item\n- مورد دیگر\n\n> نقل قول\n\n| a | ب |\n|---|---|\n| 1 | ۲ |\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_plain_lines(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            if i % 2 == 0 {
                format!("line {i} of plain english text")
            } else {
                format!("سطر {i} از متن ساده فارسی")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
