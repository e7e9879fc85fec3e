//! Foreign-ABI object descriptors.
//!
//! A descriptor mirrors a C-side object well enough to regenerate its
//! declaration: a variable name, the C type it is declared as, and any
//! struct fields. Live handles never persist; a restored descriptor
//! describes the same declaration and nothing more.

use serde::{Deserialize, Serialize};

/// One struct field: name and C type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub ctype: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ctype: impl Into<String>) -> FieldSpec {
        FieldSpec {
            name: name.into(),
            ctype: ctype.into(),
        }
    }
}

/// A named foreign-ABI object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeDescriptor {
    name: String,
    type_tag: String,
    fields: Vec<FieldSpec>,
}

impl NativeDescriptor {
    pub fn new(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> NativeDescriptor {
        NativeDescriptor {
            name: name.into(),
            type_tag: type_tag.into(),
            fields,
        }
    }

    /// An opaque communicator handle.
    pub fn communicator(name: impl Into<String>) -> NativeDescriptor {
        NativeDescriptor::new(name, "MPI_Comm", Vec::new())
    }

    /// A message status record with the standard public fields.
    pub fn status(name: impl Into<String>) -> NativeDescriptor {
        NativeDescriptor::new(
            name,
            "MPI_Status",
            vec![
                FieldSpec::new("MPI_SOURCE", "int"),
                FieldSpec::new("MPI_TAG", "int"),
                FieldSpec::new("MPI_ERROR", "int"),
            ],
        )
    }

    /// An opaque asynchronous request handle.
    pub fn request(name: impl Into<String>) -> NativeDescriptor {
        NativeDescriptor::new(name, "MPI_Request", Vec::new())
    }

    /// A halo-exchange neighbourhood: one left and one right rank per
    /// space axis, in axis order.
    pub fn neighbourhood(
        name: impl Into<String>,
        struct_name: &str,
        axes: &[&str],
    ) -> NativeDescriptor {
        let mut fields = Vec::with_capacity(axes.len() * 2);
        for axis in axes {
            fields.push(FieldSpec::new(format!("{axis}left"), "int"));
            fields.push(FieldSpec::new(format!("{axis}right"), "int"));
        }
        NativeDescriptor::new(name, format!("struct {struct_name}"), fields)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The C type the object is declared as.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}
