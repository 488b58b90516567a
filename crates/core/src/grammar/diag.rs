pub use intelhex_diagnostics::{Diagnostic, Severity, Span, codes};
