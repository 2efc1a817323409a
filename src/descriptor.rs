//! The descriptor grammar: compact textual encodings of field types,
//! the void type, and method signatures, as found in class files.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::take_until,
    character::complete::{char, one_of},
    combinator::map,
    multi::{many0, many1_count},
    sequence::delimited,
    IResult,
};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub fn key(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    pub fn from_key(key: char) -> Option<Self> {
        Some(match key {
            'B' => BaseType::Byte,
            'C' => BaseType::Char,
            'D' => BaseType::Double,
            'F' => BaseType::Float,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'S' => BaseType::Short,
            'Z' => BaseType::Boolean,
            _ => return None,
        })
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A reference to a class, held in internal (slash-separated) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectType {
    class_name: String,
}

impl ObjectType {
    /// Dot-separated names are normalised to the internal form.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into().replace('.', "/"),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{};", self.class_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    dims: usize,
    component: Box<FieldType>,
}

impl ArrayType {
    /// An array component that is itself an array is folded into the
    /// dimension count, so every value prints and re-parses to the
    /// same structure.
    pub fn new(dims: usize, component: FieldType) -> Self {
        assert!(dims >= 1, "array type needs at least one dimension");
        match component {
            FieldType::Array(inner) => Self {
                dims: dims + inner.dims,
                component: inner.component,
            },
            component => Self {
                dims,
                component: Box::new(component),
            },
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn component(&self) -> &FieldType {
        &self.component
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.dims {
            write!(f, "[")?;
        }
        write!(f, "{}", self.component)
    }
}

/// Any type a field may have; everything but void.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Base(BaseType),
    Object(ObjectType),
    Array(ArrayType),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => base.fmt(f),
            FieldType::Object(object) => object.fmt(f),
            FieldType::Array(array) => array.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Field(FieldType),
    Void,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Field(field) => field.fmt(f),
            Type::Void => write!(f, "V"),
        }
    }
}

/// A method's parameter types and return type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    params: Vec<FieldType>,
    ret: Type,
}

impl MethodDescriptor {
    pub fn new(params: Vec<FieldType>, ret: Type) -> Self {
        Self { params, ret }
    }

    pub fn params(&self) -> &[FieldType] {
        &self.params
    }

    pub fn return_type(&self) -> &Type {
        &self.ret
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for param in &self.params {
            param.fmt(f)?;
        }
        write!(f, "){}", self.ret)
    }
}

pub fn parse_type(input: &str) -> Result<Type> {
    complete(input, any_type)
}

pub fn parse_field_type(input: &str) -> Result<FieldType> {
    complete(input, field_type)
}

pub fn parse_method_descriptor(input: &str) -> Result<MethodDescriptor> {
    complete(input, method_descriptor)
}

fn complete<'a, T>(
    input: &'a str,
    mut parser: impl FnMut(&'a str) -> IResult<&'a str, T>,
) -> Result<T> {
    match parser(input) {
        Ok(("", value)) => Ok(value),
        Ok((rest, _)) => Err(classify(input, rest)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(classify(input, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(Error::IncompleteDescriptor(input.to_owned())),
    }
}

// `at` is where the scan stopped: an object name missing its `;` is a
// truncation, anything else is bad grammar.
fn classify(input: &str, at: &str) -> Error {
    if at.starts_with('L') && !at.contains(';') {
        Error::IncompleteDescriptor(input.to_owned())
    } else {
        Error::InvalidDescriptor(input.to_owned())
    }
}

fn any_type(input: &str) -> IResult<&str, Type> {
    alt((map(char('V'), |_| Type::Void), map(field_type, Type::Field)))(input)
}

fn field_type(input: &str) -> IResult<&str, FieldType> {
    alt((
        map(base_type, FieldType::Base),
        map(object_type, FieldType::Object),
        array_type,
    ))(input)
}

fn base_type(input: &str) -> IResult<&str, BaseType> {
    let (input, key) = one_of("BCDFIJSZ")(input)?;
    let base = BaseType::from_key(key).expect("one_of only matches primitive keys");
    Ok((input, base))
}

fn object_type(input: &str) -> IResult<&str, ObjectType> {
    let (input, _) = char('L')(input)?;
    let (input, class_name) = take_until(";")(input)?;
    let (input, _) = char(';')(input)?;
    Ok((input, ObjectType::new(class_name)))
}

fn array_type(input: &str) -> IResult<&str, FieldType> {
    let (input, dims) = many1_count(char('['))(input)?;
    let (input, component) = field_type(input)?;
    Ok((input, FieldType::Array(ArrayType::new(dims, component))))
}

fn method_descriptor(input: &str) -> IResult<&str, MethodDescriptor> {
    let (input, params) = delimited(char('('), many0(field_type), char(')'))(input)?;
    let (input, ret) = any_type(input)?;
    Ok((input, MethodDescriptor::new(params, ret)))
}
