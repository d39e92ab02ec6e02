#![no_main]

use arbitrary::Arbitrary;
use clickaway_dom::{SrcEntry, parse_src};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Token {
    Url(String),
    QuotedUrl(String),
    Format(String),
    Tech(String),
    Local(String),
    Comma,
    Open,
    Close,
    Quote,
    Raw(String),
}

impl Token {
    fn write(&self, out: &mut String) {
        match self {
            Token::Url(url) => {
                out.push_str("url(");
                out.push_str(url);
                out.push(')');
            }
            Token::QuotedUrl(url) => {
                out.push_str("url(\"");
                out.push_str(url);
                out.push_str("\")");
            }
            Token::Format(hint) => {
                out.push_str(" format('");
                out.push_str(hint);
                out.push_str("')");
            }
            Token::Tech(tech) => {
                out.push_str(" tech(");
                out.push_str(tech);
                out.push(')');
            }
            Token::Local(name) => {
                out.push_str("local('");
                out.push_str(name);
                out.push_str("')");
            }
            Token::Comma => out.push_str(", "),
            Token::Open => out.push('('),
            Token::Close => out.push(')'),
            Token::Quote => out.push('"'),
            Token::Raw(raw) => out.push_str(raw),
        }
    }
}

fuzz_target!(|tokens: Vec<Token>| {
    let mut src = String::new();
    for token in &tokens {
        if src.len() > 4096 {
            break;
        }
        token.write(&mut src);
    }

    if let Ok(entries) = parse_src(&src) {
        assert!(!entries.is_empty());
        for entry in entries {
            match entry {
                SrcEntry::Url { url, .. } => assert!(!url.is_empty()),
                SrcEntry::Local(name) => assert!(!name.is_empty()),
            }
        }
    }
});
