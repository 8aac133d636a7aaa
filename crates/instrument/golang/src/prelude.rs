//! Declarations available without loading the Go standard library.

/// Predeclared type identifiers of the universe scope.
pub const PREDECLARED_TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

pub fn is_predeclared(name: &str) -> bool {
    PREDECLARED_TYPES.contains(&name)
}

const IO: &str = r"package io

type Reader interface {
	Read(p []byte) (n int, err error)
}

type Writer interface {
	Write(p []byte) (n int, err error)
}

type Closer interface {
	Close() error
}

type Seeker interface {
	Seek(offset int64, whence int) (int64, error)
}

type ReadWriter interface {
	Reader
	Writer
}

type ReadCloser interface {
	Reader
	Closer
}

type WriteCloser interface {
	Writer
	Closer
}

type ReadWriteCloser interface {
	Reader
	Writer
	Closer
}
";

const FMT: &str = r"package fmt

type Stringer interface {
	String() string
}

type GoStringer interface {
	GoString() string
}
";

const CONTEXT: &str = r#"package context

import "time"

type Context interface {
	Deadline() (deadline time.Time, ok bool)
	Done() <-chan struct{}
	Err() error
	Value(key any) any
}
"#;

/// Source of a prelude package by import path.
pub fn source(import_path: &str) -> Option<&'static str> {
    match import_path {
        "io" => Some(IO),
        "fmt" => Some(FMT),
        "context" => Some(CONTEXT),
        _ => None,
    }
}
