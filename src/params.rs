//! Sweep dimensions and the parameters of a single benchmark request.
//!
//! Every categorical dimension is a closed enum whose wire name is the
//! string the benchmark service expects, e.g. `TX-CHAINING`. The same names
//! are accepted on the command line and in the config file.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How the service groups writes into transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum TxType {
    /// All writes go through one transaction chain.
    #[value(name = "TX-CHAINING")]
    #[serde(rename = "TX-CHAINING")]
    Chaining,
    /// Every transaction is independent.
    #[value(name = "SIMPLE-TX")]
    #[serde(rename = "SIMPLE-TX")]
    Simple,
}

/// Datastore operation exercised by a test run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "UPPER")]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Replace the data at a path.
    Put,
    /// Merge into the data at a path.
    Merge,
    /// Remove the data at a path.
    Delete,
    /// Read back the data at a path.
    Read,
}

/// API the service uses to build and submit data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum DataFormat {
    /// Typed, generated binding classes.
    #[value(name = "BINDING-AWARE")]
    #[serde(rename = "BINDING-AWARE")]
    BindingAware,
    /// Generic normalized nodes.
    #[value(name = "BINDING-INDEPENDENT")]
    #[serde(rename = "BINDING-INDEPENDENT")]
    BindingIndependent,
}

/// Logical datastore partition the test writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "UPPER")]
#[serde(rename_all = "UPPERCASE")]
pub enum Datastore {
    /// Configuration datastore.
    Config,
    /// Operational datastore.
    Operational,
    /// Config and operational, alternated randomly by the service.
    Both,
}

/// Which of the two test matrices to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum TestKind {
    /// Vary the shape of the list-of-lists at one operation per transaction.
    #[value(name = "DATA-FORMAT")]
    #[serde(rename = "DATA-FORMAT")]
    DataFormat,
    /// Vary operations per transaction at a flat list shape.
    #[value(name = "OPS-PER-TX")]
    #[serde(rename = "OPS-PER-TX")]
    OpsPerTx,
}

macro_rules! wire_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in canonical sweep order.
            pub const ALL: &'static [$ty] = &[$(Self::$variant),+];

            /// Name used on the wire, on the command line and in reports.
            pub const fn wire_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.wire_name())
            }
        }
    };
}

wire_names!(TxType { Chaining => "TX-CHAINING", Simple => "SIMPLE-TX" });
wire_names!(Operation { Put => "PUT", Merge => "MERGE", Delete => "DELETE", Read => "READ" });
wire_names!(DataFormat {
    BindingAware => "BINDING-AWARE",
    BindingIndependent => "BINDING-INDEPENDENT",
});
wire_names!(Datastore { Config => "CONFIG", Operational => "OPERATIONAL", Both => "BOTH" });
wire_names!(TestKind { DataFormat => "DATA-FORMAT", OpsPerTx => "OPS-PER-TX" });

/// Parameters of one `start-test` request.
///
/// `outer_elements * inner_elements` is meant to equal the campaign's total
/// element budget; the sweep builds it that way but nothing here checks it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TestParameters {
    /// Transaction style.
    #[serde(rename = "transaction-type")]
    pub tx_type: TxType,
    /// Operation type.
    pub operation: Operation,
    /// Data format.
    #[serde(rename = "data-format")]
    pub data_format: DataFormat,
    /// Target datastore.
    #[serde(rename = "data-store")]
    pub datastore: Datastore,
    /// Elements in the outer list.
    #[serde(rename = "outerElements")]
    pub outer_elements: u64,
    /// Elements in each inner list.
    #[serde(rename = "innerElements")]
    pub inner_elements: u64,
    /// Operations submitted per transaction.
    #[serde(rename = "putsPerTx")]
    pub ops_per_tx: u64,
}

impl fmt::Display for TestParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tx Type: {}, Operation: {}, Data Format: {}, Data store: {}, \
             Outer/Inner Elements: {}/{}, PutsPerTx {}",
            self.tx_type,
            self.operation,
            self.data_format,
            self.datastore,
            self.outer_elements,
            self.inner_elements,
            self.ops_per_tx
        )
    }
}
