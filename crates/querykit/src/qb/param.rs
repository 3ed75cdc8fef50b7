//! Phase-bucketed parameter storage.

use crate::value::Value;

/// Which part of a statement a bound value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Insert,
    Update,
    Where,
}

/// Bind values in three ordered buckets.
///
/// Rendered statements place INSERT values first, then UPDATE `SET` values,
/// then predicate values, so the flattened order is always
/// insert ++ update ++ where regardless of the order clauses were added in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Binder {
    insert: Vec<Value>,
    update: Vec<Value>,
    r#where: Vec<Value>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, phase: Phase) -> &mut Vec<Value> {
        match phase {
            Phase::Insert => &mut self.insert,
            Phase::Update => &mut self.update,
            Phase::Where => &mut self.r#where,
        }
    }

    /// Append one value. Literal expressions are rendered inline and never bound.
    pub fn add_param(&mut self, phase: Phase, value: impl Into<Value>) {
        let value = value.into();
        if !value.is_raw() {
            self.bucket_mut(phase).push(value);
        }
    }

    /// Append a sequence of values, in iteration order.
    pub fn add_params<I>(&mut self, phase: Phase, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        for value in values {
            self.add_param(phase, value);
        }
    }

    pub fn params_for(&self, phase: Phase) -> &[Value] {
        match phase {
            Phase::Insert => &self.insert,
            Phase::Update => &self.update,
            Phase::Where => &self.r#where,
        }
    }

    /// Every bound value in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        self.insert
            .iter()
            .chain(&self.update)
            .chain(&self.r#where)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.insert.len() + self.update.len() + self.r#where.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.insert.clear();
        self.update.clear();
        self.r#where.clear();
    }

    pub fn clear_phase(&mut self, phase: Phase) {
        self.bucket_mut(phase).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::raw;

    #[test]
    fn test_flatten_order_ignores_call_order() {
        let mut b = Binder::new();
        b.add_param(Phase::Where, 5);
        b.add_param(Phase::Update, "Bob");
        b.add_params(Phase::Insert, [1, 2]);
        b.add_param(Phase::Where, 6);
        b.add_param(Phase::Update, "x");

        assert_eq!(
            b.params(),
            vec![
                Value::Int(1),
                Value::Int(2),
                Value::from("Bob"),
                Value::from("x"),
                Value::Int(5),
                Value::Int(6),
            ]
        );
        assert_eq!(b.params_for(Phase::Update), &[Value::from("Bob"), Value::from("x")]);
        assert_eq!(b.len(), 6);
    }

    #[test]
    fn test_literal_expressions_are_not_bound() {
        let mut b = Binder::new();
        b.add_param(Phase::Update, raw("NOW()"));
        b.add_params(Phase::Where, vec![Value::Int(1), Value::Raw(raw("2 + 2"))]);
        assert_eq!(b.params(), vec![Value::Int(1)]);
    }

    #[test]
    fn test_clear() {
        let mut b = Binder::new();
        b.add_param(Phase::Insert, 1);
        b.add_param(Phase::Where, 2);
        b.clear_phase(Phase::Insert);
        assert_eq!(b.params(), vec![Value::Int(2)]);
        b.clear();
        assert!(b.is_empty());
    }
}
