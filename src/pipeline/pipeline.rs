use tracing::debug;

use super::{
    expression::{Expression, LiteralExpression, OperatorExpression},
    operator::{
        AndOperator, EqualIgnoreCaseOperator, EqualOperator, ExpOperator, GreaterEqualOperator,
        LessEqualOperator, Operator, SafeDivideOperator,
    },
    transformation::{
        DeriveTransformation, SummarizeTransformation, Transformation, WhereTransformation,
    },
    PlotError, Schema, Table, Value, ValueType,
};

/// Group selector values meaning "don't filter on the group column"
pub const SELECT_ALL_SENTINELS: [&str; 3] = ["all_values", "all", "select_all"];

pub fn is_select_all(value: &str) -> bool {
    SELECT_ALL_SENTINELS.contains(&value)
}

/**
 * One transformation stage
 */
#[derive(Debug)]
pub struct Stage {
    /**
     * The input schema of this stage
     */
    pub input_schema: Schema,

    /**
     * The output schema of this stage
     */
    pub output_schema: Schema,

    /**
     * The transformation that turns the input table into the output table
     */
    pub transformation: Box<dyn Transformation>,
}

impl Stage {
    pub fn new(input_schema: Schema, transformation: Box<dyn Transformation>) -> Self {
        let output_schema = transformation.get_output_schema(&input_schema);
        Self {
            input_schema,
            output_schema,
            transformation,
        }
    }
}

/**
 * A chain of transformations built for one table schema
 */
#[derive(Debug)]
pub struct Pipeline {
    pub name: String,
    pub input_schema: Schema,
    pub output_schema: Schema,
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /**
     * Run all stages over the table, the input table is left untouched.
     */
    pub fn process(&self, table: &Table) -> Result<Table, PlotError> {
        if table.schema != self.input_schema {
            return Err(PlotError::DataError(format!(
                "pipeline {} expects columns ({}), got ({})",
                self.name,
                self.input_schema.dump(),
                table.schema.dump()
            )));
        }
        let mut current: Option<Table> = None;
        for stage in self.stages.iter() {
            let input = current.as_ref().unwrap_or(table);
            let output = stage.transformation.transform(input)?;
            debug!(
                "{}: `{}` turned {} rows into {}",
                self.name,
                stage.transformation.dump(),
                input.len(),
                output.len()
            );
            current = Some(output);
        }
        Ok(current.unwrap_or_else(|| table.clone()))
    }

    /**
     * Dump the pipeline definition.
     */
    pub fn dump(&self) -> String {
        let mut ret = format!("{}({})\n", self.name, self.input_schema.dump());
        for stage in &self.stages {
            ret.push_str(&format!("| {}\n", stage.transformation.dump()));
        }
        ret.push(';');
        ret
    }
}

/**
 * A row predicate, predicates in one filter step are combined with AND
 */
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Text equality ignoring case
    EqualsIgnoreCase { column: String, value: String },
    /// Exact equality
    Equals { column: String, value: Value },
    /// Inclusive range
    Between {
        column: String,
        start: Value,
        end: Value,
    },
}

impl Predicate {
    pub fn equals_ignore_case(column: &str, value: &str) -> Self {
        Predicate::EqualsIgnoreCase {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn equals<T: Into<Value>>(column: &str, value: T) -> Self {
        Predicate::Equals {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn between<T: Into<Value>>(column: &str, start: T, end: T) -> Self {
        Predicate::Between {
            column: column.to_string(),
            start: start.into(),
            end: end.into(),
        }
    }

    /**
     * Exact match on the group column, None if no group or the select-all sentinel is given
     */
    pub fn group(column: &str, value: Option<&str>) -> Option<Self> {
        match value {
            Some(v) if !is_select_all(v) => Some(Self::equals(column, v.to_string())),
            _ => None,
        }
    }

    fn column(&self) -> &str {
        match self {
            Predicate::EqualsIgnoreCase { column, .. }
            | Predicate::Equals { column, .. }
            | Predicate::Between { column, .. } => column,
        }
    }

    fn to_expression(&self, schema: &Schema) -> Result<Box<dyn Expression>, PlotError> {
        let column_type = schema.get_column(self.column())?.column_type;
        let col = schema.get_col_expr(self.column())?;
        Ok(match self {
            Predicate::EqualsIgnoreCase { value, .. } => binary(
                EqualIgnoreCaseOperator,
                col,
                literal(Value::from(value.clone()), column_type),
            ),
            Predicate::Equals { value, .. } => {
                binary(EqualOperator, col, literal(value.clone(), column_type))
            }
            Predicate::Between { start, end, .. } => binary(
                AndOperator,
                binary(
                    GreaterEqualOperator,
                    col.clone(),
                    literal(start.clone(), column_type),
                ),
                binary(LessEqualOperator, col, literal(end.clone(), column_type)),
            ),
        })
    }
}

/// Literal in the column's type, e.g. a selector "3" compared with a numeric group column
fn literal(value: Value, column_type: ValueType) -> Box<dyn Expression> {
    let value_type = value.value_type();
    let value = if value_type == column_type
        || (value_type.is_numeric() && column_type.is_numeric())
    {
        value
    } else {
        value.clone().try_convert(column_type).unwrap_or(value)
    };
    Box::new(LiteralExpression { value })
}

fn binary<O: Operator + 'static>(
    operator: O,
    left: Box<dyn Expression>,
    right: Box<dyn Expression>,
) -> Box<dyn Expression> {
    Box::new(OperatorExpression {
        operator: Box::new(operator),
        arguments: vec![left, right],
    })
}

/**
 * How a derived column is computed
 */
#[derive(Clone, Debug, PartialEq)]
pub enum Derivation {
    /// `numerator / denominator`, zero when undefined
    Ratio {
        numerator: String,
        denominator: String,
    },
    /// `exp(column)`
    Exp(String),
}

impl Derivation {
    fn to_expression(&self, schema: &Schema) -> Result<Box<dyn Expression>, PlotError> {
        Ok(match self {
            Derivation::Ratio {
                numerator,
                denominator,
            } => binary(
                SafeDivideOperator,
                schema.get_col_expr(numerator)?,
                schema.get_col_expr(denominator)?,
            ),
            Derivation::Exp(column) => Box::new(OperatorExpression {
                operator: Box::new(ExpOperator),
                arguments: vec![schema.get_col_expr(column)?],
            }),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
enum QueryStep {
    Filter(Vec<Predicate>),
    GroupBy(Vec<String>),
    Derive { column: String, derivation: Derivation },
}

/**
 * Declarative description of filter / aggregate / derive steps.
 * The same query is used by every plot, grouping modes only differ in the steps they add.
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableQuery {
    name: String,
    steps: Vec<QueryStep>,
}

impl TableQuery {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: vec![],
        }
    }

    /// Keep rows matching all predicates, an empty predicate list adds no step
    pub fn filter<T>(mut self, predicates: T) -> Self
    where
        T: IntoIterator<Item = Predicate>,
    {
        let predicates: Vec<Predicate> = predicates.into_iter().collect();
        if !predicates.is_empty() {
            self.steps.push(QueryStep::Filter(predicates));
        }
        self
    }

    pub fn group_by<T, S>(mut self, keys: T) -> Self
    where
        T: IntoIterator<Item = S>,
        S: ToString,
    {
        self.steps.push(QueryStep::GroupBy(
            keys.into_iter().map(|k| k.to_string()).collect(),
        ));
        self
    }

    pub fn derive(mut self, column: &str, derivation: Derivation) -> Self {
        self.steps.push(QueryStep::Derive {
            column: column.to_string(),
            derivation,
        });
        self
    }

    /**
     * Compile the query into a pipeline for tables with the given schema
     */
    pub fn build(&self, input_schema: &Schema) -> Result<Pipeline, PlotError> {
        let mut stages = vec![];
        let mut schema = input_schema.clone();
        for step in self.steps.iter() {
            let transformation = match step {
                QueryStep::Filter(predicates) => {
                    let mut iter = predicates.iter();
                    let first = match iter.next() {
                        Some(p) => p.to_expression(&schema)?,
                        None => continue,
                    };
                    let predicate = iter.try_fold(first, |acc, p| {
                        Ok::<_, PlotError>(binary(AndOperator, acc, p.to_expression(&schema)?))
                    })?;
                    WhereTransformation::create(&schema, predicate)?
                }
                QueryStep::GroupBy(keys) => SummarizeTransformation::create(&schema, keys.clone())?,
                QueryStep::Derive { column, derivation } => DeriveTransformation::create(
                    &schema,
                    column,
                    derivation.to_expression(&schema)?,
                )?,
            };
            let stage = Stage::new(schema, transformation);
            schema = stage.output_schema.clone();
            stages.push(stage);
        }
        Ok(Pipeline {
            name: self.name.clone(),
            input_schema: input_schema.clone(),
            output_schema: schema,
            stages,
        })
    }

    /**
     * Build and run the query against the table
     */
    pub fn run(&self, table: &Table) -> Result<Table, PlotError> {
        let pipeline = self.build(&table.schema)?;
        debug!("Running pipeline\n{}", pipeline.dump());
        pipeline.process(table)
    }
}
