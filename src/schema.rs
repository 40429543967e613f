use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Kind of value a schema field is expected to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
}

/// Columns of the `corridas` table, in insertion order.
///
/// Projection walks this table, so adding or renaming a column is a one-line
/// change here.
pub const SCHEMA: [(&str, FieldKind); 19] = [
    ("data_do_periodo", FieldKind::Text),
    ("periodo", FieldKind::Text),
    ("duracao_do_periodo", FieldKind::Number),
    (
        "numero_minimo_de_entregadores_regulares_na_escala",
        FieldKind::Number,
    ),
    ("tag", FieldKind::Text),
    ("id_da_pessoa_entregadora", FieldKind::Text),
    ("pessoa_entregadora", FieldKind::Text),
    ("praca", FieldKind::Text),
    ("sub_praca", FieldKind::Text),
    ("origem", FieldKind::Text),
    ("tempo_disponivel_escalado", FieldKind::Number),
    ("tempo_disponivel_absoluto", FieldKind::Number),
    ("numero_de_corridas_ofertadas", FieldKind::Number),
    ("numero_de_corridas_aceitas", FieldKind::Number),
    ("numero_de_corridas_rejeitadas", FieldKind::Number),
    ("numero_de_corridas_completadas", FieldKind::Number),
    (
        "numero_de_corridas_canceladas_pela_pessoa_entregadora",
        FieldKind::Number,
    ),
    ("numero_de_pedidos_aceitos_e_concluidos", FieldKind::Number),
    ("soma_das_taxas_das_corridas_aceitas", FieldKind::Number),
];

/// One data row of the first sheet, keyed by header text.
///
/// Only non-empty cells are present; every value is the cell's display text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetRow {
    cells: HashMap<String, String>,
}

impl SheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, text: impl Into<String>) {
        self.cells.insert(header.into(), text.into());
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SheetRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = SheetRow::new();
        for (header, text) in iter {
            row.insert(header, text);
        }
        row
    }
}

/// A projected value, serialized as a bare JSON string or number.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Number(number) => number.serialize(serializer),
        }
    }
}

/// A schema-shaped row ready to be inserted.
///
/// Fields keep schema order. Absent fields are simply not stored, so they are
/// omitted from the JSON object rather than sent as `null`, `0` or `""`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowRecord {
    fields: Vec<(&'static str, FieldValue)>,
}

impl RowRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Project a sheet row onto [`SCHEMA`].
///
/// Number fields whose text is a plain decimal literal are carried as JSON
/// numbers; any other text is forwarded unchanged and left for the backend to
/// coerce. Columns outside the schema are dropped.
pub fn project(row: &SheetRow) -> RowRecord {
    let fields = SCHEMA
        .iter()
        .filter_map(|&(name, kind)| {
            let text = row.get(name)?;
            let value = match kind {
                FieldKind::Number => numeric_value(text)
                    .map(FieldValue::Number)
                    .unwrap_or_else(|| FieldValue::Text(text.to_string())),
                FieldKind::Text => FieldValue::Text(text.to_string()),
            };
            Some((name, value))
        })
        .collect();

    RowRecord { fields }
}

fn numeric_value(text: &str) -> Option<serde_json::Number> {
    let text = text.trim();
    let digits = text.strip_prefix('-').unwrap_or(text);
    let plain = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit());
    if !plain {
        return None;
    }

    if !digits.contains('.') {
        // Integers past i64 would lose digits as f64; they stay text.
        return text.parse::<i64>().ok().map(Into::into);
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_has_unique_names() {
        let mut names: Vec<&str> = SCHEMA.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SCHEMA.len());
    }

    #[test]
    fn missing_fields_stay_absent() {
        let row: SheetRow = [("tag", "A"), ("praca", "SP")].into_iter().collect();
        let record = project(&row);

        assert_eq!(record.len(), 2);
        assert!(record.get("numero_de_corridas_aceitas").is_none());
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"tag": "A", "praca": "SP"})
        );
    }

    #[test]
    fn extra_columns_are_dropped() {
        let row: SheetRow = [("tag", "A"), ("coluna_extra", "x")].into_iter().collect();
        let record = project(&row);
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["tag"]);
    }

    #[test]
    fn number_fields_become_json_numbers_when_plain() {
        let row: SheetRow = [
            ("numero_de_corridas_aceitas", "12"),
            ("soma_das_taxas_das_corridas_aceitas", "15.5"),
            ("duracao_do_periodo", "01:30:00"),
            ("tempo_disponivel_escalado", "-3"),
        ]
        .into_iter()
        .collect();
        let value = serde_json::to_value(project(&row)).unwrap();

        assert_eq!(value["numero_de_corridas_aceitas"], json!(12));
        assert_eq!(value["soma_das_taxas_das_corridas_aceitas"], json!(15.5));
        assert_eq!(value["duracao_do_periodo"], json!("01:30:00"));
        assert_eq!(value["tempo_disponivel_escalado"], json!(-3));
    }

    #[test]
    fn text_fields_keep_numeric_looking_text() {
        let row: SheetRow = [("id_da_pessoa_entregadora", "00123")].into_iter().collect();
        let value = serde_json::to_value(project(&row)).unwrap();
        assert_eq!(value["id_da_pessoa_entregadora"], json!("00123"));
    }

    #[test]
    fn fields_follow_schema_order() {
        let row: SheetRow = [("origem", "app"), ("data_do_periodo", "2024-01-15")]
            .into_iter()
            .collect();
        let record = project(&row);
        assert_eq!(
            record.field_names().collect::<Vec<_>>(),
            vec!["data_do_periodo", "origem"]
        );
    }

    #[test]
    fn numeric_value_rejects_non_decimal_text() {
        assert!(numeric_value("1e5").is_none());
        assert!(numeric_value("NaN").is_none());
        assert!(numeric_value("1.2.3").is_none());
        assert!(numeric_value("-").is_none());
        assert!(numeric_value(".").is_none());
        assert_eq!(numeric_value(" 7 "), Some(7.into()));
    }

    #[test]
    fn oversized_integers_are_sent_as_text() {
        assert!(numeric_value("123456789012345678901234").is_none());
        assert_eq!(numeric_value("-42"), Some((-42).into()));

        let row: SheetRow = [("numero_de_corridas_aceitas", "123456789012345678901234")]
            .into_iter()
            .collect();
        let value = serde_json::to_value(project(&row)).unwrap();
        assert_eq!(
            value["numero_de_corridas_aceitas"],
            json!("123456789012345678901234")
        );
    }
}
