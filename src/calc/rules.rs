//! Ordered operation rules
//!
//! Each rule pairs a pattern with an operation. The table is searched in a
//! fixed order and the first rule whose pattern occurs anywhere in the
//! transcript decides the result, even if a later rule would also match.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Unsigned decimal operand
const NUM: &str = r"(\d+(?:\.\d+)?)";

/// Decimal operand that may carry a leading minus sign
const SIGNED_NUM: &str = r"(-?\d+(?:\.\d+)?)";

/// Left operand of a binary operation; a minus sign counts only when nothing
/// word-like precedes it, so "8-3" stays a subtraction
const LEAD: &str = r"(?:^|[^\w.])(-?\d+(?:\.\d+)?)";

/// Largest integer whose factorial still fits in an `f64`
pub const MAX_FACTORIAL: f64 = 170.0;

/// Why a matched operation produced no value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReason {
    /// Divisor was zero
    #[error("division by zero")]
    DivisionByZero,

    /// Square root of a negative number
    #[error("negative sqrt")]
    NegativeSquareRoot,

    /// Logarithm of zero or a negative number
    #[error("non-positive logarithm")]
    NonPositiveLogarithm,

    /// Factorial operand outside `0..=170`
    #[error("factorial out of range")]
    FactorialOutOfRange,

    /// Factorial of a fractional number
    #[error("factorial of non-integer")]
    FactorialNotInteger,

    /// Tangent at an odd multiple of 90 degrees
    #[error("tangent undefined")]
    UndefinedTangent,

    /// NaN or infinite result
    #[error("result not a finite number")]
    NotFinite,

    /// A captured operand could not be parsed
    #[error("malformed operand: {0}")]
    MalformedOperand(String),
}

impl InvalidReason {
    /// Spanish explanation suitable for speech
    #[must_use]
    pub fn spoken(&self) -> String {
        match self {
            Self::DivisionByZero => "No se puede dividir entre cero".to_string(),
            Self::NegativeSquareRoot => {
                "No existe la raíz cuadrada real de un número negativo".to_string()
            }
            Self::NonPositiveLogarithm => {
                "El logaritmo solo está definido para números positivos".to_string()
            }
            Self::FactorialOutOfRange => {
                "El factorial solo está disponible entre 0 y 170".to_string()
            }
            Self::FactorialNotInteger => {
                "El factorial solo está definido para números enteros".to_string()
            }
            Self::UndefinedTangent => "La tangente no está definida para ese ángulo".to_string(),
            Self::NotFinite => "El resultado no es un número válido".to_string(),
            Self::MalformedOperand(raw) => format!("No pude leer el número {raw}"),
        }
    }
}

/// How many operands a rule captures from the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One captured operand
    Unary,
    /// Two captured operands
    Binary,
}

/// Every operation the calculator recognises, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    PreviousAdd,
    PreviousSubtract,
    PreviousMultiply,
    SquareRoot,
    CubeRoot,
    Sine,
    Cosine,
    Tangent,
    Log10,
    NaturalLog,
    Factorial,
    Percentage,
    CelsiusToFahrenheit,
    FahrenheitToCelsius,
}

impl OperationKind {
    /// Table order; first match wins
    pub const ALL: [Self; 19] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Power,
        Self::PreviousAdd,
        Self::PreviousSubtract,
        Self::PreviousMultiply,
        Self::SquareRoot,
        Self::CubeRoot,
        Self::Sine,
        Self::Cosine,
        Self::Tangent,
        Self::Log10,
        Self::NaturalLog,
        Self::Factorial,
        Self::Percentage,
        Self::CelsiusToFahrenheit,
        Self::FahrenheitToCelsius,
    ];

    /// Label stored in history entries
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "suma",
            Self::Subtract => "resta",
            Self::Multiply => "multiplicación",
            Self::Divide => "división",
            Self::Power => "potencia",
            Self::PreviousAdd => "suma con resultado anterior",
            Self::PreviousSubtract => "resta con resultado anterior",
            Self::PreviousMultiply => "multiplicación con resultado anterior",
            Self::SquareRoot => "raíz cuadrada",
            Self::CubeRoot => "raíz cúbica",
            Self::Sine => "seno",
            Self::Cosine => "coseno",
            Self::Tangent => "tangente",
            Self::Log10 => "logaritmo base 10",
            Self::NaturalLog => "logaritmo natural",
            Self::Factorial => "factorial",
            Self::Percentage => "porcentaje",
            Self::CelsiusToFahrenheit => "conversión celsius a fahrenheit",
            Self::FahrenheitToCelsius => "conversión fahrenheit a celsius",
        }
    }

    /// Label with its Spanish preposition and article, for replies
    #[must_use]
    pub const fn spoken(self) -> &'static str {
        match self {
            Self::Add => "de la suma",
            Self::Subtract => "de la resta",
            Self::Multiply => "de la multiplicación",
            Self::Divide => "de la división",
            Self::Power => "de la potencia",
            Self::PreviousAdd => "de la suma con el resultado anterior",
            Self::PreviousSubtract => "de la resta con el resultado anterior",
            Self::PreviousMultiply => "de la multiplicación con el resultado anterior",
            Self::SquareRoot => "de la raíz cuadrada",
            Self::CubeRoot => "de la raíz cúbica",
            Self::Sine => "del seno",
            Self::Cosine => "del coseno",
            Self::Tangent => "de la tangente",
            Self::Log10 => "del logaritmo base 10",
            Self::NaturalLog => "del logaritmo natural",
            Self::Factorial => "del factorial",
            Self::Percentage => "del porcentaje",
            Self::CelsiusToFahrenheit => "de la conversión de celsius a fahrenheit",
            Self::FahrenheitToCelsius => "de la conversión de fahrenheit a celsius",
        }
    }

    /// Number of operands captured from the transcript
    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::Add
            | Self::Subtract
            | Self::Multiply
            | Self::Divide
            | Self::Power
            | Self::Percentage => Arity::Binary,
            _ => Arity::Unary,
        }
    }

    /// Whether the previous result is used as the left operand
    #[must_use]
    pub const fn uses_previous(self) -> bool {
        matches!(
            self,
            Self::PreviousAdd | Self::PreviousSubtract | Self::PreviousMultiply
        )
    }

    /// Source pattern for this operation
    fn pattern(self) -> String {
        match self {
            Self::Add => format!(r"{LEAD}\s*(?:más|mas|suma|sumado|plus|\+)\s*{NUM}\b"),
            Self::Subtract => format!(r"{LEAD}\s*(?:menos|resta|restado|restar|-)\s*{NUM}\b"),
            Self::Multiply => format!(
                r"{LEAD}\s*(?:por|multiplicado|multiplicar|times|\*|x)\s*(?:por\s*)?{NUM}\b"
            ),
            Self::Divide => format!(
                r"{LEAD}\s*(?:entre|dividido|dividir|división|division|/)\s*(?:por\s*|entre\s*)?{NUM}\b"
            ),
            Self::Power => format!(
                r"{LEAD}\s*(?:elevado|potencia|exponente|\^|\*\*)\s*(?:a\s*(?:la\s*)?)?{NUM}\b"
            ),
            Self::PreviousAdd => format!(r"\b(?:resultado|anterior)\s*(?:más|mas|\+)\s*{NUM}\b"),
            Self::PreviousSubtract => format!(r"\b(?:resultado|anterior)\s*(?:menos|-)\s*{NUM}\b"),
            Self::PreviousMultiply => format!(
                r"\b(?:resultado|anterior)\s*(?:multiplicado\s*por|por|\*|x)\s*{NUM}\b"
            ),
            Self::SquareRoot => format!(r"\bra[ií]z\s*cuadrada\s*(?:de\s*)?{SIGNED_NUM}\b"),
            Self::CubeRoot => format!(r"\bra[ií]z\s*c[uú]bica\s*(?:de\s*)?{SIGNED_NUM}\b"),
            Self::Sine => format!(r"\bseno\s*(?:de\s*)?{SIGNED_NUM}\b"),
            Self::Cosine => format!(r"\bcoseno\s*(?:de\s*)?{SIGNED_NUM}\b"),
            Self::Tangent => format!(r"\btangente\s*(?:de\s*)?{SIGNED_NUM}\b"),
            Self::Log10 => format!(
                r"\blogaritmo\s*(?:(?:en\s*)?base\s*10\s*)?(?:de\s*)?{SIGNED_NUM}\b"
            ),
            Self::NaturalLog => format!(
                r"\b(?:logaritmo\s*natural|ln)\s*(?:de\s*)?{SIGNED_NUM}\b"
            ),
            Self::Factorial => format!(r"\bfactorial\s*(?:de\s*)?{SIGNED_NUM}\b"),
            Self::Percentage => format!(
                r"\b{NUM}\s*(?:por\s*ciento|porciento|%)\s*(?:de\s*)?{NUM}\b"
            ),
            Self::CelsiusToFahrenheit => format!(
                r"(?:^|\s){SIGNED_NUM}\s*grados\s*(?:celsius\s*|centígrados\s*)?a\s*fahrenheit\b"
            ),
            Self::FahrenheitToCelsius => format!(
                r"(?:^|\s){SIGNED_NUM}\s*grados\s*fahrenheit\s*a\s*(?:celsius|centígrados)\b"
            ),
        }
    }

    /// Apply the operation to parsed operands
    ///
    /// Pure: the previous result is passed in, never read from shared state.
    fn apply(self, operands: &[f64], last_result: f64) -> Result<f64, InvalidReason> {
        let a = operands.first().copied().unwrap_or_default();
        let b = operands.get(1).copied().unwrap_or_default();

        match self {
            Self::Add => Ok(a + b),
            Self::Subtract => Ok(a - b),
            Self::Multiply => Ok(a * b),
            Self::Divide => {
                if b == 0.0 {
                    Err(InvalidReason::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }
            Self::Power => Ok(a.powf(b)),
            Self::PreviousAdd => Ok(last_result + a),
            Self::PreviousSubtract => Ok(last_result - a),
            Self::PreviousMultiply => Ok(last_result * a),
            Self::SquareRoot => {
                if a < 0.0 {
                    Err(InvalidReason::NegativeSquareRoot)
                } else {
                    Ok(a.sqrt())
                }
            }
            Self::CubeRoot => Ok(a.cbrt()),
            Self::Sine => Ok(a.to_radians().sin()),
            Self::Cosine => Ok(a.to_radians().cos()),
            Self::Tangent => {
                let radians = a.to_radians();
                if radians.cos().abs() < 1e-12 {
                    Err(InvalidReason::UndefinedTangent)
                } else {
                    Ok(radians.tan())
                }
            }
            Self::Log10 => {
                if a <= 0.0 {
                    Err(InvalidReason::NonPositiveLogarithm)
                } else {
                    Ok(a.log10())
                }
            }
            Self::NaturalLog => {
                if a <= 0.0 {
                    Err(InvalidReason::NonPositiveLogarithm)
                } else {
                    Ok(a.ln())
                }
            }
            Self::Factorial => factorial(a),
            Self::Percentage => Ok(a * b / 100.0),
            Self::CelsiusToFahrenheit => Ok(a * 9.0 / 5.0 + 32.0),
            Self::FahrenheitToCelsius => Ok((a - 32.0) * 5.0 / 9.0),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Factorial over `0..=170`, integers only
fn factorial(n: f64) -> Result<f64, InvalidReason> {
    if n.fract() != 0.0 {
        return Err(InvalidReason::FactorialNotInteger);
    }
    if !(0.0..=MAX_FACTORIAL).contains(&n) {
        return Err(InvalidReason::FactorialOutOfRange);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = n as u32;
    Ok((1..=n).map(f64::from).product())
}

/// A successful evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Finite numeric result
    pub value: f64,
    /// Operation that produced it
    pub kind: OperationKind,
}

impl Evaluation {
    /// Human-readable operation label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Outcome of running a transcript through the rule table
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// A rule matched and produced a finite value
    Evaluated(Evaluation),
    /// A rule matched but the operation is undefined for its operands
    Invalid {
        /// Operation that matched
        kind: OperationKind,
        /// Why no value was produced
        reason: InvalidReason,
    },
    /// No rule matched
    NoMatch,
}

/// One compiled rule
#[derive(Debug)]
pub struct OperationRule {
    kind: OperationKind,
    pattern: Regex,
}

impl OperationRule {
    fn compile(kind: OperationKind) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!("(?i){}", kind.pattern()))?;
        Ok(Self { kind, pattern })
    }

    /// Operation this rule evaluates
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Operand count captured by the pattern
    #[must_use]
    pub const fn arity(&self) -> Arity {
        self.kind.arity()
    }

    /// Try this rule against the text
    ///
    /// Returns `None` when the pattern does not occur.
    fn try_evaluate(&self, text: &str, last_result: f64) -> Option<MatchOutcome> {
        let caps = self.pattern.captures(text)?;

        let operands: Result<Vec<f64>, InvalidReason> = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| {
                m.as_str()
                    .parse::<f64>()
                    .map_err(|_| InvalidReason::MalformedOperand(m.as_str().to_string()))
            })
            .collect();

        let result = operands.and_then(|ops| self.kind.apply(&ops, last_result));

        Some(match result {
            Ok(value) if value.is_finite() => MatchOutcome::Evaluated(Evaluation {
                value,
                kind: self.kind,
            }),
            Ok(_) => MatchOutcome::Invalid {
                kind: self.kind,
                reason: InvalidReason::NotFinite,
            },
            Err(reason) => MatchOutcome::Invalid {
                kind: self.kind,
                reason,
            },
        })
    }
}

/// The ordered rule table
#[derive(Debug)]
pub struct OperationMatcher {
    rules: Vec<OperationRule>,
}

static STANDARD: LazyLock<OperationMatcher> =
    LazyLock::new(|| OperationMatcher::new().expect("valid operation patterns"));

impl OperationMatcher {
    /// Compile every rule in table order
    ///
    /// # Errors
    ///
    /// Returns error if a pattern fails to compile
    pub fn new() -> Result<Self, regex::Error> {
        let rules = OperationKind::ALL
            .into_iter()
            .map(OperationRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = rules.len(), "compiled operation rules");
        Ok(Self { rules })
    }

    /// Shared instance compiled on first use
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Rules in the order they are tried
    #[must_use]
    pub fn rules(&self) -> &[OperationRule] {
        &self.rules
    }

    /// Evaluate a normalized transcript
    ///
    /// `last_result` is the left operand for the previous-result rules.
    #[must_use]
    pub fn evaluate(&self, text: &str, last_result: f64) -> MatchOutcome {
        for rule in &self.rules {
            if let Some(outcome) = rule.try_evaluate(text, last_result) {
                tracing::debug!(operation = %rule.kind, text, ?outcome, "operation rule matched");
                return outcome;
            }
        }

        tracing::debug!(text, "no operation rule matched");
        MatchOutcome::NoMatch
    }
}
