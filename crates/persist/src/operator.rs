//! Operator envelopes.
//!
//! An operator persists as its generated source, its compiler signature,
//! and its parameter list, each parameter as a full sub-envelope. The
//! compiled kernel is deliberately absent: restoration hands the source
//! back to the compilation cache on first apply, the same path a fresh
//! operator takes, so captured state can never disagree with what runs.

use serde::{Deserialize, Serialize};

use mantle_grid::Function;
use mantle_operator::{CompilerSignature, Operator, Parameter};

use crate::carrier::{decode_constant, encode_constant, ConstantEnvelope, FunctionEnvelope};
use crate::dimension::{decode_dimension, encode_dimension, DimensionEnvelope};
use crate::envelope::{ObjectKind, Persistable};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterEnvelope {
    Function(FunctionEnvelope),
    Scalar(ConstantEnvelope),
    Dimension(DimensionEnvelope),
}

impl ParameterEnvelope {
    fn name(&self) -> &str {
        match self {
            ParameterEnvelope::Function(f) => &f.name,
            ParameterEnvelope::Scalar(c) => &c.name,
            ParameterEnvelope::Dimension(d) => &d.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorEnvelope {
    pub source: String,
    pub target: String,
    pub flags: Vec<String>,
    pub parameters: Vec<ParameterEnvelope>,
}

impl Persistable for Operator {
    const KIND: ObjectKind = ObjectKind::Operator;
    type Envelope = OperatorEnvelope;

    fn capture(&self) -> Result<OperatorEnvelope> {
        let mut parameters = Vec::with_capacity(self.parameters().len());
        for parameter in self.parameters() {
            parameters.push(match parameter {
                Parameter::Function(f) => ParameterEnvelope::Function(f.capture()?),
                Parameter::Scalar(c) => ParameterEnvelope::Scalar(encode_constant(c)),
                Parameter::Dimension(d) => ParameterEnvelope::Dimension(encode_dimension(d)),
            });
        }
        Ok(OperatorEnvelope {
            source: self.source().to_string(),
            target: self.signature().target.clone(),
            flags: self.signature().flags.clone(),
            parameters,
        })
    }

    fn restore(envelope: OperatorEnvelope) -> Result<Operator> {
        let mut parameters = Vec::with_capacity(envelope.parameters.len());
        for parameter in envelope.parameters {
            let name = parameter.name().to_string();
            let restored = match parameter {
                ParameterEnvelope::Function(f) => Function::restore(f).map(Parameter::Function),
                ParameterEnvelope::Scalar(c) => Ok(Parameter::Scalar(decode_constant(c))),
                ParameterEnvelope::Dimension(d) => decode_dimension(d).map(Parameter::Dimension),
            };
            match restored {
                Ok(parameter) => parameters.push(parameter),
                // One bad reference voids the whole operator; a
                // partially wired operator must never come back.
                Err(source) => {
                    return Err(Error::CorruptReference {
                        parameter: name,
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(Operator::from_captured(
            envelope.source,
            CompilerSignature::new(envelope.target, envelope.flags),
            parameters,
        ))
    }
}
