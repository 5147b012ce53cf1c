use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

/// All possible token types of the contract language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Numeric literal, kept as written (decimal or `0x` hex)
    Number(String),
    /// String literal (single or double quoted)
    String(String),
    /// Boolean true literal
    True,
    /// Boolean false literal
    False,

    /// Identifier
    Identifier(String),

    // Keywords
    /// `import`
    Import,
    /// `from`
    From,
    /// `export`
    Export,
    /// `default`
    Default,
    /// `class`
    Class,
    /// `extends`
    Extends,
    /// `implements`
    Implements,
    /// `constructor`
    Constructor,
    /// `const`
    Const,
    /// `let`
    Let,
    /// `if`
    If,
    /// `else`
    Else,
    /// `for`
    For,
    /// `while`
    While,
    /// `do`
    Do,
    /// `return`
    Return,
    /// `this`
    This,
    /// `new`
    New,
    /// `static`
    Static,
    /// `break`
    Break,
    /// `continue`
    Continue,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==` or `===`
    Eq,
    /// `!=` or `!==`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `=>`
    FatArrow,

    // Delimiters
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `;`
    Semicolon,
    /// `@` (decorator marker)
    At,

    /// End of file marker
    Eof,
}

impl TokenKind {
    /// Maps an identifier to its keyword token, if it is one
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "import" => TokenKind::Import,
            "from" => TokenKind::From,
            "export" => TokenKind::Export,
            "default" => TokenKind::Default,
            "class" => TokenKind::Class,
            "extends" => TokenKind::Extends,
            "implements" => TokenKind::Implements,
            "constructor" => TokenKind::Constructor,
            "const" => TokenKind::Const,
            "let" => TokenKind::Let,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "return" => TokenKind::Return,
            "this" => TokenKind::This,
            "new" => TokenKind::New,
            "static" => TokenKind::Static,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        };
        Some(kind)
    }

    /// Check if token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Import
                | TokenKind::From
                | TokenKind::Export
                | TokenKind::Default
                | TokenKind::Class
                | TokenKind::Extends
                | TokenKind::Implements
                | TokenKind::Constructor
                | TokenKind::Const
                | TokenKind::Let
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Return
                | TokenKind::This
                | TokenKind::New
                | TokenKind::Static
                | TokenKind::Break
                | TokenKind::Continue
        )
    }

    /// Keywords that are still valid property names after a `.`
    /// (`this.from`, `msg.value`), or method names in a class body
    pub fn as_property_name(&self) -> Option<&'static str> {
        match self {
            TokenKind::From => Some("from"),
            TokenKind::Default => Some("default"),
            TokenKind::New => Some("new"),
            TokenKind::Do => Some("do"),
            TokenKind::Import => Some("import"),
            TokenKind::Export => Some("export"),
            _ => None,
        }
    }
}
