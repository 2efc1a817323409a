use std::sync::Arc;

use nom::{
    bytes::complete::{tag, take},
    combinator::eof,
    error_position,
    multi::count,
    number::complete::{be_u16, be_u32, u8},
    IResult,
};

use crate::class::{
    Class, ClassAccessFlag, FieldAccessFlag, FieldInfo, MethodAccessFlag, MethodInfo,
};

/// Constant-pool slots, resolved no further than the reader needs.
#[derive(Debug)]
enum ConstantPoolInfo {
    Utf8(Arc<str>),
    Class { name_index: u16 },
    /// An entry whose payload the reader skips over.
    Skipped,
    /// The phantom slot following a long or double entry.
    Empty,
}

pub(crate) fn class_file(input: &[u8]) -> IResult<&[u8], Class> {
    let (input, _) = parse_header(input)?;
    let (input, constant_pool) = parse_constant_pool(input)?;

    let (input, access_flags) = be_u16(input)?;
    let (input, this_class) = be_u16(input)?;
    let (input, super_class) = be_u16(input)?;
    let (input, interface_indices) = parse_interfaces(input)?;
    let (input, fields) = parse_fields(input, &constant_pool)?;
    let (input, methods) = parse_methods(input, &constant_pool)?;
    let (input, _) = skip_attributes(input)?;
    eof(input)?;

    let name = resolve_class_name(&constant_pool, this_class).ok_or_else(|| bad_pool_ref(input))?;
    let super_name = if super_class == 0 {
        None
    } else {
        Some(resolve_class_name(&constant_pool, super_class).ok_or_else(|| bad_pool_ref(input))?)
    };
    let interfaces = interface_indices
        .iter()
        .map(|&index| resolve_class_name(&constant_pool, index).ok_or_else(|| bad_pool_ref(input)))
        .collect::<Result<_, _>>()?;

    Ok((
        input,
        Class {
            access_flags: ClassAccessFlag::from_bits_retain(access_flags),
            name,
            super_name,
            interfaces,
            fields,
            methods,
        },
    ))
}

fn parse_header(input: &[u8]) -> IResult<&[u8], (u16, u16)> {
    let (input, _) = tag(&[0xca, 0xfe, 0xba, 0xbe][..])(input)?;
    let (input, minor) = be_u16(input)?;
    let (input, major) = be_u16(input)?;
    Ok((input, (minor, major)))
}

fn parse_constant_pool(input: &[u8]) -> IResult<&[u8], Vec<ConstantPoolInfo>> {
    let (input, constant_pool_count) = be_u16(input)?;
    let slots = constant_pool_count.saturating_sub(1) as usize;

    let mut constant_pool = Vec::with_capacity(slots);
    let mut input = input;

    while constant_pool.len() < slots {
        let (entry, double_width);
        (input, (entry, double_width)) = parse_constant(input)?;
        constant_pool.push(entry);
        if double_width {
            constant_pool.push(ConstantPoolInfo::Empty);
        }
    }

    Ok((input, constant_pool))
}

fn parse_constant(mut input: &[u8]) -> IResult<&[u8], (ConstantPoolInfo, bool)> {
    let tag_byte;
    (input, tag_byte) = u8(input)?;

    let entry = match tag_byte {
        // Utf8
        1 => {
            let length;
            (input, length) = be_u16(input)?;
            let bytes;
            (input, bytes) = take(length)(input)?;
            let text = cesu8::from_java_cesu8(bytes)
                .map_err(|_| nom::Err::Error(error_position!(input, nom::error::ErrorKind::Verify)))?;
            (ConstantPoolInfo::Utf8(Arc::from(text.as_ref())), false)
        }
        // Class
        7 => {
            let name_index;
            (input, name_index) = be_u16(input)?;
            (ConstantPoolInfo::Class { name_index }, false)
        }
        // Long, Double: two pool slots
        5 | 6 => {
            (input, _) = take(8usize)(input)?;
            (ConstantPoolInfo::Skipped, true)
        }
        // Integer, Float
        3 | 4 => {
            (input, _) = take(4usize)(input)?;
            (ConstantPoolInfo::Skipped, false)
        }
        // String, MethodType, Module, Package
        8 | 16 | 19 | 20 => {
            (input, _) = take(2usize)(input)?;
            (ConstantPoolInfo::Skipped, false)
        }
        // Fieldref, Methodref, InterfaceMethodref, NameAndType,
        // Dynamic, InvokeDynamic
        9 | 10 | 11 | 12 | 17 | 18 => {
            (input, _) = take(4usize)(input)?;
            (ConstantPoolInfo::Skipped, false)
        }
        // MethodHandle
        15 => {
            (input, _) = take(3usize)(input)?;
            (ConstantPoolInfo::Skipped, false)
        }
        _ => {
            return Err(nom::Err::Error(error_position!(
                input,
                nom::error::ErrorKind::Tag
            )));
        }
    };
    Ok((input, entry))
}

fn parse_interfaces(input: &[u8]) -> IResult<&[u8], Vec<u16>> {
    let (input, interface_count) = be_u16(input)?;
    let (input, interfaces) = count(be_u16, interface_count as _)(input)?;
    Ok((input, interfaces))
}

fn parse_fields<'a>(
    input: &'a [u8],
    pool: &[ConstantPoolInfo],
) -> IResult<&'a [u8], Vec<FieldInfo>> {
    let (input, field_count) = be_u16(input)?;
    let (input, fields) = count(parse_field(pool), field_count as _)(input)?;
    Ok((input, fields))
}

fn parse_field(pool: &[ConstantPoolInfo]) -> impl FnMut(&[u8]) -> IResult<&[u8], FieldInfo> + '_ {
    move |input| {
        let (input, (access_flags, name, descriptor)) = parse_member(input, pool)?;
        Ok((
            input,
            FieldInfo {
                access_flags: FieldAccessFlag::from_bits_retain(access_flags),
                name,
                descriptor,
            },
        ))
    }
}

fn parse_methods<'a>(
    input: &'a [u8],
    pool: &[ConstantPoolInfo],
) -> IResult<&'a [u8], Vec<MethodInfo>> {
    let (input, method_count) = be_u16(input)?;
    let (input, methods) = count(parse_method(pool), method_count as _)(input)?;
    Ok((input, methods))
}

fn parse_method(pool: &[ConstantPoolInfo]) -> impl FnMut(&[u8]) -> IResult<&[u8], MethodInfo> + '_ {
    move |input| {
        let (input, (access_flags, name, descriptor)) = parse_member(input, pool)?;
        Ok((
            input,
            MethodInfo {
                access_flags: MethodAccessFlag::from_bits_retain(access_flags),
                name,
                descriptor,
            },
        ))
    }
}

fn parse_member<'a>(
    input: &'a [u8],
    pool: &[ConstantPoolInfo],
) -> IResult<&'a [u8], (u16, Arc<str>, Arc<str>)> {
    let (input, access_flags) = be_u16(input)?;
    let (input, name_index) = be_u16(input)?;
    let (input, descriptor_index) = be_u16(input)?;
    let (input, _) = skip_attributes(input)?;

    let name = resolve_utf8(pool, name_index).ok_or_else(|| bad_pool_ref(input))?;
    let descriptor = resolve_utf8(pool, descriptor_index).ok_or_else(|| bad_pool_ref(input))?;
    Ok((input, (access_flags, name, descriptor)))
}

fn skip_attributes(input: &[u8]) -> IResult<&[u8], ()> {
    let (input, attributes_count) = be_u16(input)?;
    let (input, _) = count(skip_attribute, attributes_count as _)(input)?;
    Ok((input, ()))
}

fn skip_attribute(input: &[u8]) -> IResult<&[u8], ()> {
    let (input, _) = be_u16(input)?;
    let (input, attribute_length) = be_u32(input)?;
    let (input, _) = take(attribute_length)(input)?;
    Ok((input, ()))
}

fn resolve_utf8(pool: &[ConstantPoolInfo], index: u16) -> Option<Arc<str>> {
    match pool.get(index.checked_sub(1)? as usize)? {
        ConstantPoolInfo::Utf8(text) => Some(Arc::clone(text)),
        _ => None,
    }
}

fn resolve_class_name(pool: &[ConstantPoolInfo], index: u16) -> Option<Arc<str>> {
    match pool.get(index.checked_sub(1)? as usize)? {
        ConstantPoolInfo::Class { name_index } => resolve_utf8(pool, *name_index),
        _ => None,
    }
}

fn bad_pool_ref(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(error_position!(input, nom::error::ErrorKind::Verify))
}
