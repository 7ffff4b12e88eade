// lazyarr — lazy symbolic arrays with R-style subscripting
//
// Library root. Array operators build nodes in a `graph::Graph`; the script
// front-end (lexer, parser, eval) drives them from source text.

pub mod combine;
pub mod convenience;
pub mod diag;
pub mod error;
pub mod graph;
pub mod id;
pub mod indexing;
pub mod layout;
pub mod reshape;
pub mod shape;
pub mod shape_infer;
pub mod subscript;
pub mod value;

pub mod ast;
pub mod dot;
pub mod eval;
pub mod export;
pub mod lexer;
pub mod parser;
pub mod pipeline;
