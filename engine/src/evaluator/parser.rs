//! Recursive-descent parser for arithmetic expressions
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | '(' expr ')'
//! NUMBER  := DIGITS ['.' DIGITS?] | '.' DIGITS
//! ```

use super::error::EvalError;
use super::expr::{BinaryOp, Expr, UnaryOp};

/// Maximum nesting of parentheses and unary signs
const MAX_DEPTH: usize = 200;

/// Maximum number of operators in one expression.
///
/// Operator chains build a left-deep tree, so this also bounds the depth
/// walked by evaluation, rendering and drop.
pub const MAX_OPERATORS: usize = 500;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Parse an expression string into an expression tree
pub fn parse(input: &str) -> Result<Expr, EvalError> {
    if input.trim().is_empty() {
        return Err(EvalError::EmptyInput);
    }

    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        depth: 0,
        operators: 0,
    };

    let expr = parser.parse_expr()?;
    if let Some(token) = parser.peek() {
        let detail = format!("unexpected {}", describe(token));
        return Err(parser.syntax(detail));
    }
    Ok(expr)
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                let mut seen_dot = false;
                let mut digits = 0;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        digits += 1;
                    } else if c == '.' && !seen_dot {
                        seen_dot = true;
                    } else {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                let text = &input[start..end];
                if digits == 0 {
                    return Err(syntax(input, format!("malformed number '{}'", text)));
                }
                tokens.push(Token::Number(text.to_string()));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '*'))) {
                    return Err(EvalError::UnsupportedOperator("**".to_string()));
                }
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '/'))) {
                    return Err(EvalError::UnsupportedOperator("//".to_string()));
                }
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '%' | '^' | '&' | '|' | '<' | '>' | '=' | '!' | '~' | '@' | '×' | '÷' => {
                return Err(EvalError::UnsupportedOperator(ch.to_string()));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                return Err(syntax(
                    input,
                    format!(
                        "unsupported expression component '{}'; variables and functions are not allowed",
                        &input[start..end]
                    ),
                ));
            }
            other => {
                return Err(syntax(input, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

fn syntax(input: &str, detail: String) -> EvalError {
    EvalError::Syntax {
        expression: input.to_string(),
        detail,
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(text) => format!("number '{}'", text),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn syntax(&self, detail: String) -> EvalError {
        syntax(self.input, detail)
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.syntax("expression is nested too deeply".to_string()));
        }
        Ok(())
    }

    fn count_operator(&mut self) -> Result<(), EvalError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(self.syntax(format!(
                "expression has more than {} operators",
                MAX_OPERATORS
            )));
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            self.count_operator()?;
            let right = self.parse_term()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            self.count_operator()?;
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        self.advance();
        self.count_operator()?;
        self.descend()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::unary(op, operand))
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Some(Token::Number(text)) => {
                let value: f64 = text
                    .parse()
                    .map_err(|_| self.syntax(format!("malformed number '{}'", text)))?;
                Ok(Expr::literal(text, value))
            }
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => {
                        self.depth -= 1;
                        Ok(inner)
                    }
                    Some(other) => Err(self.syntax(format!(
                        "expected ')' but found {}",
                        describe(&other)
                    ))),
                    None => Err(self.syntax("unbalanced parentheses".to_string())),
                }
            }
            Some(other) => Err(self.syntax(format!("unexpected {}", describe(&other)))),
            None => Err(self.syntax("unexpected end of expression".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let expr = parse("2 + 3 * 4").unwrap();
        match expr {
            Expr::Binary { op, ref right, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(**right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            _ => panic!("expected binary node"),
        }
    }

    #[test]
    fn test_left_associativity() {
        let expr = parse("8 - 4 - 2").unwrap();
        assert_eq!(expr.to_string(), "8 - 4 - 2");
        match expr {
            Expr::Binary { ref left, .. } => {
                assert!(matches!(**left, Expr::Binary { op: BinaryOp::Sub, .. }));
            }
            _ => panic!("expected binary node"),
        }
    }

    #[test]
    fn test_decimal_forms() {
        assert!(parse("3.5").is_ok());
        assert!(parse(".5 + 5.").is_ok());
        assert!(matches!(parse("1.2.3"), Err(EvalError::Syntax { .. })));
        assert!(matches!(parse("."), Err(EvalError::Syntax { .. })));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), Err(EvalError::EmptyInput));
        assert_eq!(parse("   \t"), Err(EvalError::EmptyInput));
    }

    #[test]
    fn test_unsupported_operators() {
        assert_eq!(
            parse("2 ** 3"),
            Err(EvalError::UnsupportedOperator("**".to_string()))
        );
        assert_eq!(
            parse("7 // 2"),
            Err(EvalError::UnsupportedOperator("//".to_string()))
        );
        assert_eq!(
            parse("7 % 2"),
            Err(EvalError::UnsupportedOperator("%".to_string()))
        );
    }

    #[test]
    fn test_syntax_errors() {
        for input in ["2 +", "(1 + 2", "1 + 2)", "()", "2 3", "x + 1", "sqrt(4)", "2 $ 3"] {
            assert!(
                matches!(parse(input), Err(EvalError::Syntax { .. })),
                "expected syntax error for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert!(matches!(parse(&deep), Err(EvalError::Syntax { .. })));

        let signs = format!("{}1", "-".repeat(500));
        assert!(matches!(parse(&signs), Err(EvalError::Syntax { .. })));
    }

    #[test]
    fn test_operator_limit() {
        let at_limit = vec!["1"; MAX_OPERATORS + 1].join(" + ");
        assert!(parse(&at_limit).is_ok());

        let over = vec!["1"; MAX_OPERATORS + 2].join("*");
        assert!(matches!(parse(&over), Err(EvalError::Syntax { .. })));

        let huge = vec!["1"; 100_000].join("+");
        match parse(&huge) {
            Err(EvalError::Syntax { detail, .. }) => assert!(detail.contains("operators")),
            other => panic!("expected syntax error, got {:?}", other.map(|_| ())),
        }
    }
}
