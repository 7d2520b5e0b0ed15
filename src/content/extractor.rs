use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// Plain text pulled out of a page's `<body>`, with `<script>` content dropped.
///
/// Works in one pass over the token stream; no tree is built. Malformed
/// or unbalanced markup is handled by "last tag seen wins" on the two
/// tracked flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

#[derive(Debug, Default)]
struct TextSink {
    text: String,
    in_body: bool,
    in_script: bool,
}

impl TextSink {
    fn handle_tag(&mut self, tag: &Tag) -> TokenSinkResult<()> {
        let opening = tag.kind == TagKind::StartTag;

        match &*tag.name {
            "body" => self.in_body = opening,
            "script" => {
                self.in_script = opening;
                // Script bodies are raw text, not markup
                if opening && !tag.self_closing {
                    return TokenSinkResult::RawData(RawKind::ScriptData);
                }
            }
            _ => {}
        }

        TokenSinkResult::Continue
    }
}

impl TokenSink for TextSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => self.handle_tag(&tag),
            Token::CharacterTokens(text) => {
                if self.in_body && !self.in_script {
                    self.text.push_str(&text);
                }
                TokenSinkResult::Continue
            }
            _ => TokenSinkResult::Continue,
        }
    }
}

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract body text from `html`.
    ///
    /// The result is trimmed and every `\n` and `\t` is replaced by a
    /// single space.
    pub fn extract_text(&self, html: &str) -> String {
        let mut tokenizer = Tokenizer::new(TextSink::default(), TokenizerOpts::default());

        let mut input = BufferQueue::new();
        input.push_back(StrTendril::from_slice(html));
        let _ = tokenizer.feed(&mut input);
        tokenizer.end();

        normalize_whitespace(tokenizer.sink.text.trim())
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\t' => ' ',
            c => c,
        })
        .collect()
}

/// Shorthand for `TextExtractor::new().extract_text(html)`.
pub fn extract_text(html: &str) -> String {
    TextExtractor::new().extract_text(html)
}
