//! Conversion procedure synthesis.
//!
//! For a pair of types the synthesizer emits a JavaScript procedure that
//! turns a JSON value of the first type into a JSON value of the second:
//!
//! ```text
//! function convert(input) {
//!     let value = JSON.parse(input);
//!     return JSON.stringify(<expression over value>);
//! }
//! ```
//!
//! Scalars follow a fixed compatibility table. Objects map matched (or
//! renamed) properties and fill the rest with defaults, enums map raw
//! values, and collections map element-wise. Whenever information may be
//! lost the procedure carries a caveat.

use crate::compare::matching::match_elements;
use crate::config::CompareConfig;
use crate::defaults::DefaultValueSynthesizer;
use crate::script::Script;
use crate::similarity::type_names_match;
use apidelta_model::{
    EncoderConfiguration, PrimitiveType, TypeDescriptor, TypeName, TypesStore,
};
use serde_json::{Map, Value};

/// Whether values of `a` decode as `b` without a conversion.
///
/// Composites compare by relaxed name only; their structural changes are
/// reported on the models themselves.
pub fn types_match(a: &TypeDescriptor, b: &TypeDescriptor, type_name_threshold: f64) -> bool {
    match (a, b) {
        (TypeDescriptor::Scalar(p), TypeDescriptor::Scalar(q)) => p == q,
        (TypeDescriptor::Optional { wrapped: x }, TypeDescriptor::Optional { wrapped: y }) => {
            types_match(x, y, type_name_threshold)
        }
        (TypeDescriptor::Repeated { element: x }, TypeDescriptor::Repeated { element: y }) => {
            types_match(x, y, type_name_threshold)
        }
        (
            TypeDescriptor::Dictionary { key: kx, value: x },
            TypeDescriptor::Dictionary { key: ky, value: y },
        ) => kx == ky && types_match(x, y, type_name_threshold),
        (a, b) if is_named(a) && is_named(b) => {
            type_names_match(&a.type_name(), &b.type_name(), type_name_threshold)
        }
        _ => false,
    }
}

fn is_named(descriptor: &TypeDescriptor) -> bool {
    descriptor.is_composite() || descriptor.is_reference()
}

/// Outcome of a synthesis attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// A procedure converting between the types.
    Procedure {
        script: Script,
        /// Set when the conversion may lose information.
        caveat: Option<String>,
    },
    /// No meaningful conversion exists.
    Unsupported { reason: String },
}

impl Conversion {
    pub fn is_supported(&self) -> bool {
        matches!(self, Conversion::Procedure { .. })
    }
}

/// Partial JavaScript expression plus the caveats collected while building it.
struct Expr {
    code: String,
    caveats: Vec<String>,
}

impl Expr {
    fn plain(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            caveats: Vec::new(),
        }
    }

    fn lossy(code: impl Into<String>, caveat: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            caveats: vec![caveat.into()],
        }
    }

    fn with(mut self, caveats: Vec<String>) -> Self {
        self.caveats.extend(caveats);
        self
    }
}

type Attempt = std::result::Result<Expr, String>;

/// Synthesizes conversions from types of one document to types of another.
#[derive(Debug, Clone, Copy)]
pub struct ConversionSynthesizer<'a> {
    from_types: &'a TypesStore,
    to_types: &'a TypesStore,
    config: &'a CompareConfig,
    encoder: EncoderConfiguration,
}

impl<'a> ConversionSynthesizer<'a> {
    /// `from_types` resolves references in source types, `to_types` in
    /// target types.
    pub fn new(
        from_types: &'a TypesStore,
        to_types: &'a TypesStore,
        config: &'a CompareConfig,
        encoder: EncoderConfiguration,
    ) -> Self {
        Self {
            from_types,
            to_types,
            config,
            encoder,
        }
    }

    /// Build a procedure converting `from` values into `to` values.
    pub fn synthesize(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> Conversion {
        let mut chain = Vec::new();
        match self.expr(from, to, "value", 0, &mut chain) {
            Ok(expr) => {
                let mut caveats = expr.caveats;
                caveats.dedup();
                Conversion::Procedure {
                    script: render(&expr.code),
                    caveat: (!caveats.is_empty()).then(|| caveats.join("; ")),
                }
            }
            Err(reason) => Conversion::Unsupported { reason },
        }
    }

    fn default_literal(&self, to: &TypeDescriptor) -> std::result::Result<String, String> {
        let value = DefaultValueSynthesizer::new(self.to_types, self.encoder)
            .synthesize(to)
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&value).map_err(|e| e.to_string())
    }

    fn expr(
        &self,
        from: &TypeDescriptor,
        to: &TypeDescriptor,
        x: &str,
        depth: usize,
        chain: &mut Vec<(TypeName, TypeName)>,
    ) -> Attempt {
        if types_match(from, to, self.config.type_name_threshold) {
            return Ok(Expr::plain(x));
        }

        match (from, to) {
            (TypeDescriptor::Reference { .. }, _) | (_, TypeDescriptor::Reference { .. }) => {
                let pair = (from.type_name(), to.type_name());
                if chain.contains(&pair) {
                    return Err(format!(
                        "recursive conversion from {} to {}",
                        pair.0, pair.1
                    ));
                }
                let resolved_from = resolve(self.from_types, from)?;
                let resolved_to = resolve(self.to_types, to)?;
                chain.push(pair);
                let result = self.expr(resolved_from, resolved_to, x, depth, chain);
                chain.pop();
                result
            }
            (TypeDescriptor::Optional { wrapped: a }, TypeDescriptor::Optional { wrapped: b }) => {
                let inner = self.expr(a, b, x, depth, chain)?;
                Ok(Expr::plain(format!("({x} == null ? null : {})", inner.code)).with(inner.caveats))
            }
            (TypeDescriptor::Optional { wrapped: a }, b) => {
                let inner = self.expr(a, b, x, depth, chain)?;
                let default = self.default_literal(b)?;
                Ok(Expr::lossy(
                    format!("({x} == null ? {default} : {})", inner.code),
                    "missing values are replaced by a default",
                )
                .with(inner.caveats))
            }
            (a, TypeDescriptor::Optional { wrapped: b }) => self.expr(a, b, x, depth, chain),
            (TypeDescriptor::Scalar(p), TypeDescriptor::Scalar(q)) => scalar(*p, *q, x),
            (TypeDescriptor::Repeated { element: a }, TypeDescriptor::Repeated { element: b }) => {
                let v = format!("v{depth}");
                let inner = self.expr(a, b, &v, depth + 1, chain)?;
                Ok(Expr::plain(format!("{x}.map(({v}) => {})", inner.code)).with(inner.caveats))
            }
            (
                TypeDescriptor::Dictionary { key: ka, value: a },
                TypeDescriptor::Dictionary { key: kb, value: b },
            ) => {
                let (k, v) = (format!("k{depth}"), format!("v{depth}"));
                let inner = self.expr(a, b, &v, depth + 1, chain)?;
                let mut expr = Expr::plain(format!(
                    "Object.fromEntries(Object.entries({x}).map(([{k}, {v}]) => [{k}, {}]))",
                    inner.code
                ))
                .with(inner.caveats);
                if ka != kb {
                    expr.caveats
                        .push(format!("dictionary keys are kept as is when changing from {ka} to {kb}"));
                }
                Ok(expr)
            }
            (TypeDescriptor::Repeated { element: a }, b) => {
                let inner = self.expr(a, b, &format!("{x}[0]"), depth, chain)?;
                let default = self.default_literal(b)?;
                Ok(Expr::lossy(
                    format!("({x}.length > 0 ? {} : {default})", inner.code),
                    "only the first element of a collection is kept",
                )
                .with(inner.caveats))
            }
            (a, TypeDescriptor::Repeated { element: b }) => {
                let inner = self.expr(a, b, x, depth, chain)?;
                Ok(Expr::plain(format!("[{}]", inner.code)).with(inner.caveats))
            }
            (TypeDescriptor::Object { .. }, TypeDescriptor::Object { .. }) => {
                self.object(from, to, x, depth, chain)
            }
            (TypeDescriptor::Enum { .. }, TypeDescriptor::Enum { .. }) => {
                enumeration(from, to, x, self.config.rename_threshold)
            }
            (
                TypeDescriptor::Enum { raw_value_type, .. },
                TypeDescriptor::Scalar(q),
            ) => scalar(*raw_value_type, *q, x),
            (
                TypeDescriptor::Scalar(p),
                TypeDescriptor::Enum {
                    raw_value_type,
                    cases,
                    ..
                },
            ) => {
                let first = cases
                    .first()
                    .map(|c| c.raw_json(*raw_value_type))
                    .ok_or_else(|| format!("enum {} has no cases", to.type_name()))?;
                let raw = scalar(*p, *raw_value_type, x)?;
                let known: Vec<Value> = cases.iter().map(|c| c.raw_json(*raw_value_type)).collect();
                let known = serde_json::to_string(&known).map_err(|e| e.to_string())?;
                Ok(Expr::lossy(
                    format!("((r) => {known}.includes(r) ? r : {first})({})", raw.code),
                    format!("values without a matching case become {first}"),
                )
                .with(raw.caveats))
            }
            (a, b) => Err(format!(
                "no conversion from {} {} to {} {}",
                kind_name(a),
                a.type_name(),
                kind_name(b),
                b.type_name()
            )),
        }
    }

    fn object(
        &self,
        from: &TypeDescriptor,
        to: &TypeDescriptor,
        x: &str,
        depth: usize,
        chain: &mut Vec<(TypeName, TypeName)>,
    ) -> Attempt {
        let threshold = self.config.type_name_threshold;
        let matching = match_elements(
            from.properties(),
            to.properties(),
            self.config.rename_threshold,
            "property",
            |l, r| type_names_match(&l.type_.type_name(), &r.type_.type_name(), threshold),
        )
        .map_err(|e| e.to_string())?;

        let mut caveats = Vec::new();
        let mut fields = Vec::with_capacity(to.properties().len());
        for target in to.properties() {
            let key = json_string(&target.name)?;
            let source = matching.pairs().find(|(_, r)| r.name == target.name).map(|(l, _)| l);
            let code = match source {
                Some(source) => {
                    let access = format!("{x}[{}]", json_string(&source.name)?);
                    match self.expr(&source.type_, &target.type_, &access, depth, chain) {
                        Ok(inner) => {
                            caveats.extend(inner.caveats);
                            inner.code
                        }
                        Err(reason) => {
                            caveats.push(format!("property '{}' is reset: {reason}", target.name));
                            self.default_literal(&target.type_)?
                        }
                    }
                }
                None => {
                    if !target.type_.is_optional() {
                        caveats.push(format!("property '{}' is filled with a default", target.name));
                    }
                    self.default_literal(&target.type_)?
                }
            };
            fields.push(format!("{key}: {code}"));
        }
        for removed in &matching.removed {
            caveats.push(format!("property '{}' is dropped", removed.name));
        }

        Ok(Expr::plain(format!("({{{}}})", fields.join(", "))).with(caveats))
    }
}

fn resolve<'s>(store: &'s TypesStore, descriptor: &'s TypeDescriptor) -> std::result::Result<&'s TypeDescriptor, String> {
    match descriptor {
        TypeDescriptor::Reference { key } => store.get(key).map_err(|e| e.to_string()),
        other => Ok(other),
    }
}

fn kind_name(descriptor: &TypeDescriptor) -> &'static str {
    match descriptor {
        TypeDescriptor::Scalar(_) => "scalar",
        TypeDescriptor::Repeated { .. } => "repeated",
        TypeDescriptor::Dictionary { .. } => "dictionary",
        TypeDescriptor::Optional { .. } => "optional",
        TypeDescriptor::Enum { .. } => "enum",
        TypeDescriptor::Object { .. } => "object",
        TypeDescriptor::Reference { .. } => "reference",
    }
}

fn json_string(raw: &str) -> std::result::Result<String, String> {
    serde_json::to_string(raw).map_err(|e| e.to_string())
}

/// Integer literal for a script, capped to what a JavaScript number holds exactly.
fn js_bound(bound: i128) -> String {
    const SAFE: i128 = (1 << 53) - 1;
    if bound > SAFE {
        "Number.MAX_SAFE_INTEGER".to_string()
    } else if bound < -SAFE {
        "Number.MIN_SAFE_INTEGER".to_string()
    } else {
        bound.to_string()
    }
}

fn render(expression: &str) -> Script {
    Script::new(format!(
        "function convert(input) {{\n    let value = JSON.parse(input);\n    return JSON.stringify({expression});\n}}"
    ))
}

fn enumeration(from: &TypeDescriptor, to: &TypeDescriptor, x: &str, threshold: f64) -> Attempt {
    let (from_raw, to_raw) = match (from.raw_value_type(), to.raw_value_type()) {
        (Some(f), Some(t)) => (f, t),
        _ => return Err("enum conversion between non-enum types".to_string()),
    };
    let first = to
        .cases()
        .first()
        .map(|c| c.raw_json(to_raw))
        .ok_or_else(|| format!("enum {} has no cases", to.type_name()))?;

    let matching =
        match_elements(from.cases(), to.cases(), threshold, "case", |_, _| true).map_err(|e| e.to_string())?;

    let mut table = Map::new();
    for (l, r) in matching.pairs() {
        table.insert(l.raw_value.clone(), r.raw_json(to_raw));
    }
    let table = serde_json::to_string(&Value::Object(table)).map_err(|e| e.to_string())?;

    let mut expr = Expr::plain(format!("({table}[String({x})] ?? {first})"));
    if !matching.removed.is_empty() {
        expr.caveats
            .push(format!("cases without a counterpart become {first}"));
    }
    if from_raw != to_raw {
        expr.caveats
            .push(format!("raw values change from {from_raw} to {to_raw}"));
    }
    Ok(expr)
}

/// Scalar compatibility table.
fn scalar(p: PrimitiveType, q: PrimitiveType, x: &str) -> Attempt {
    use PrimitiveType as P;

    if p == q {
        return Ok(Expr::plain(x));
    }
    match (p, q) {
        _ if p.is_numeric() && q.is_numeric() => {
            if q.is_integer() && p.is_floating_point() {
                Ok(Expr::lossy(
                    format!("Math.trunc(Number({x}))"),
                    "fractional parts are truncated",
                ))
            } else if q.is_integer() {
                let narrower = q.bit_width() < p.bit_width()
                    || (p.is_signed() && !q.is_signed())
                    || (!p.is_signed() && q.is_signed() && q.bit_width() <= p.bit_width());
                match q.integer_range() {
                    Some((min, max)) if narrower => Ok(Expr::lossy(
                        format!(
                            "Math.min(Math.max(Math.trunc(Number({x})), {}), {})",
                            js_bound(min),
                            js_bound(max)
                        ),
                        format!("values outside the range of {q} are clamped"),
                    )),
                    _ => Ok(Expr::plain(x)),
                }
            } else if p == P::Double && q == P::Float {
                Ok(Expr::lossy(format!("Number({x})"), "precision may be lost"))
            } else {
                Ok(Expr::plain(format!("Number({x})")))
            }
        }
        _ if p.is_numeric() && q == P::String => Ok(Expr::plain(format!("String({x})"))),
        (P::String, q) if q.is_integer() => Ok(Expr::lossy(
            format!("(Number.isNaN(parseInt({x}, 10)) ? 0 : parseInt({x}, 10))"),
            "non-numeric strings become 0",
        )),
        (P::String, q) if q.is_floating_point() => Ok(Expr::lossy(
            format!("(Number.isNaN(parseFloat({x})) ? 0 : parseFloat({x}))"),
            "non-numeric strings become 0",
        )),
        (P::Bool, P::String) => Ok(Expr::plain(format!("String({x})"))),
        (P::String, P::Bool) => Ok(Expr::lossy(
            format!("({x} === 'true')"),
            "strings other than 'true' become false",
        )),
        (P::Uuid | P::Url, P::String) => Ok(Expr::plain(x)),
        (P::String, P::Uuid | P::Url) => Ok(Expr::lossy(
            x,
            format!("strings that are not a valid {q} fail to decode"),
        )),
        _ => Err(format!("no conversion from {p} to {q}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidelta_model::{EnumCase, TypeProperty};

    fn synth<'a>(store: &'a TypesStore, config: &'a CompareConfig) -> ConversionSynthesizer<'a> {
        ConversionSynthesizer::new(store, store, config, EncoderConfiguration::default())
    }

    fn script(conversion: &Conversion) -> &str {
        match conversion {
            Conversion::Procedure { script, .. } => script.source(),
            Conversion::Unsupported { reason } => panic!("Expected procedure, got {reason}"),
        }
    }

    #[test]
    fn test_int_string_round_trip() {
        let store = TypesStore::new();
        let config = CompareConfig::default();
        let s = synth(&store, &config);
        let int = TypeDescriptor::scalar(PrimitiveType::Int);
        let string = TypeDescriptor::scalar(PrimitiveType::String);

        let forward = s.synthesize(&int, &string);
        assert!(script(&forward).contains("String(value)"));
        assert!(script(&forward).starts_with("function convert(input)"));
        match &forward {
            Conversion::Procedure { caveat, .. } => assert!(caveat.is_none()),
            _ => panic!("Expected procedure"),
        }

        let backward = s.synthesize(&string, &int);
        assert!(script(&backward).contains("parseInt(value, 10)"));
        match &backward {
            Conversion::Procedure { caveat, .. } => assert!(caveat.is_some()),
            _ => panic!("Expected procedure"),
        }
    }

    #[test]
    fn test_incompatible_scalars() {
        let store = TypesStore::new();
        let config = CompareConfig::default();
        let conversion = synth(&store, &config).synthesize(
            &TypeDescriptor::scalar(PrimitiveType::Date),
            &TypeDescriptor::scalar(PrimitiveType::Bool),
        );
        assert!(!conversion.is_supported());
    }

    #[test]
    fn test_narrowing_is_lossy() {
        let store = TypesStore::new();
        let config = CompareConfig::default();
        match synth(&store, &config).synthesize(
            &TypeDescriptor::scalar(PrimitiveType::Int64),
            &TypeDescriptor::scalar(PrimitiveType::UInt8),
        ) {
            Conversion::Procedure { script, caveat } => {
                assert!(script
                    .source()
                    .contains("Math.min(Math.max(Math.trunc(Number(value)), 0), 255)"));
                assert!(caveat.unwrap().contains("UInt8"));
            }
            _ => panic!("Expected procedure"),
        }
    }

    #[test]
    fn test_unsigned_to_signed_same_width_is_clamped() {
        let store = TypesStore::new();
        let config = CompareConfig::default();
        let s = synth(&store, &config);
        for (from, to) in [
            (PrimitiveType::UInt64, PrimitiveType::Int64),
            (PrimitiveType::UInt, PrimitiveType::Int),
        ] {
            match s.synthesize(&TypeDescriptor::scalar(from), &TypeDescriptor::scalar(to)) {
                Conversion::Procedure { script, caveat } => {
                    assert!(script.source().contains(
                        "Math.max(Math.trunc(Number(value)), Number.MIN_SAFE_INTEGER), Number.MAX_SAFE_INTEGER)"
                    ));
                    assert!(caveat.is_some());
                }
                _ => panic!("Expected procedure"),
            }
        }

        let widening = s.synthesize(
            &TypeDescriptor::scalar(PrimitiveType::UInt32),
            &TypeDescriptor::scalar(PrimitiveType::Int64),
        );
        match widening {
            Conversion::Procedure { script, caveat } => {
                assert!(!script.source().contains("Math.min"));
                assert!(caveat.is_none());
            }
            _ => panic!("Expected procedure"),
        }
    }

    #[test]
    fn test_collections_and_optionals() {
        let store = TypesStore::new();
        let config = CompareConfig::default();
        let s = synth(&store, &config);
        let int = TypeDescriptor::scalar(PrimitiveType::Int);
        let double = TypeDescriptor::scalar(PrimitiveType::Double);

        let mapped = s.synthesize(&TypeDescriptor::repeated(int.clone()), &TypeDescriptor::repeated(double.clone()));
        assert!(script(&mapped).contains("value.map((v0) => Number(v0))"));

        let wrapped = s.synthesize(&int, &TypeDescriptor::repeated(int.clone()));
        assert!(script(&wrapped).contains("[value]"));

        let unwrapped = s.synthesize(&TypeDescriptor::optional(int.clone()), &int);
        assert!(script(&unwrapped).contains("(value == null ? 0 : value)"));
    }

    #[test]
    fn test_object_mapping() {
        let store = TypesStore::new();
        let config = CompareConfig::default();
        let from = TypeDescriptor::object(
            "UserV1",
            vec![
                TypeProperty::new("userId", TypeDescriptor::scalar(PrimitiveType::Int)),
                TypeProperty::new("legacy", TypeDescriptor::scalar(PrimitiveType::Bool)),
            ],
        );
        let to = TypeDescriptor::object(
            "Account",
            vec![
                TypeProperty::new("id", TypeDescriptor::scalar(PrimitiveType::Int)),
                TypeProperty::new("email", TypeDescriptor::scalar(PrimitiveType::String)),
            ],
        );

        match synth(&store, &config).synthesize(&from, &to) {
            Conversion::Procedure { script, caveat } => {
                assert!(script.source().contains(r#""id": value["userId"]"#));
                assert!(script.source().contains(r#""email": """#));
                let caveat = caveat.unwrap();
                assert!(caveat.contains("'email' is filled"));
                assert!(caveat.contains("'legacy' is dropped"));
            }
            _ => panic!("Expected procedure"),
        }
    }

    #[test]
    fn test_enum_mapping() {
        let store = TypesStore::new();
        let config = CompareConfig::default();
        let from = TypeDescriptor::enumeration(
            "Level",
            vec![EnumCase::new("low"), EnumCase::new("high"), EnumCase::new("extreme")],
        );
        let to = TypeDescriptor::enumeration_with_raw_type(
            "Tier",
            PrimitiveType::Int,
            vec![EnumCase::with_raw_value("low", "1"), EnumCase::with_raw_value("high", "2")],
        );

        match synth(&store, &config).synthesize(&from, &to) {
            Conversion::Procedure { script, caveat } => {
                assert!(script.source().contains(r#"{"high":2,"low":1}"#));
                assert!(script.source().contains("?? 1"));
                assert!(caveat.unwrap().contains("cases without a counterpart"));
            }
            _ => panic!("Expected procedure"),
        }
    }

    #[test]
    fn test_enum_mapping_uses_rename_threshold() {
        let store = TypesStore::new();
        let from = TypeDescriptor::enumeration("LegacyField", vec![EnumCase::new("userId")]);
        let to = TypeDescriptor::enumeration("Column", vec![EnumCase::new("other"), EnumCase::new("id")]);

        let strict = CompareConfig::default().with_rename_threshold(0.95);
        match synth(&store, &strict).synthesize(&from, &to) {
            Conversion::Procedure { script, caveat } => {
                assert!(!script.source().contains(r#""userId":"id""#));
                assert!(script.source().contains(r#"({}[String(value)] ?? "other")"#));
                assert!(caveat.unwrap().contains("cases without a counterpart"));
            }
            _ => panic!("Expected procedure"),
        }
    }

    #[test]
    fn test_enum_to_object_unsupported() {
        let store = TypesStore::new();
        let config = CompareConfig::default();
        let conversion = synth(&store, &config).synthesize(
            &TypeDescriptor::enumeration("Shape", vec![EnumCase::new("circle")]),
            &TypeDescriptor::object("Figure", vec![]),
        );
        match conversion {
            Conversion::Unsupported { reason } => assert!(reason.contains("enum")),
            _ => panic!("Expected Unsupported"),
        }
    }

    #[test]
    fn test_types_match() {
        let user = TypeDescriptor::reference("User");
        let user_object = TypeDescriptor::object("User", vec![]);
        assert!(types_match(&user, &user_object, 0.75));
        assert!(!types_match(
            &TypeDescriptor::scalar(PrimitiveType::Int),
            &TypeDescriptor::optional(TypeDescriptor::scalar(PrimitiveType::Int)),
            0.75
        ));
        assert!(!types_match(
            &TypeDescriptor::repeated(user.clone()),
            &TypeDescriptor::repeated(TypeDescriptor::reference("Invoice")),
            0.75
        ));
    }
}
