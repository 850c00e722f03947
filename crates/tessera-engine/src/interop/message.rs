//! Guest-facing message table
//!
//! Every interop message is also a static method of the guest class
//! `org/tessera/polyglot/Interop`. [`Message`] lists them with their guest
//! names and descriptors; [`Message::invoke`] decodes the guest argument
//! slots, sends the message through [`protocol`](super::protocol) and
//! encodes the result. All methods share one dispatch function instead of a
//! node per method.

use tessera_sdk::ByteOrder;

use crate::context::InteropContext;
use crate::exception::Thrown;
use crate::interop::protocol;
use crate::meta::names;
use crate::object::{GuestRef, GuestValue, NativeData};
use crate::substitution::signature_of;
use crate::symbol::Symbol;

const O: &str = "Ljava/lang/Object;";
const STR: &str = "Ljava/lang/String;";
const OBJS: &str = "[Ljava/lang/Object;";
const ORDER: &str = "Ljava/nio/ByteOrder;";
const BIG: &str = "Ljava/math/BigInteger;";
const EXC_TYPE: &str = "Lorg/tessera/polyglot/ExceptionType;";
const RUNTIME_EXC: &str = "Ljava/lang/RuntimeException;";
const Z: &str = "Z";
const B: &str = "B";
const S: &str = "S";
const I: &str = "I";
const J: &str = "J";
const F: &str = "F";
const D: &str = "D";
const V: &str = "V";

// ============================================================================
// Argument decoding
// ============================================================================

/// Guest argument slots of one call
pub(crate) struct Args<'a> {
    ctx: &'a InteropContext,
    slots: &'a [GuestValue],
}

impl<'a> Args<'a> {
    pub(crate) fn new(ctx: &'a InteropContext, slots: &'a [GuestValue]) -> Self {
        Self { ctx, slots }
    }

    fn illegal(&self, index: usize, expected: &str) -> Thrown {
        self.ctx
            .meta()
            .throw(names().illegal_argument, format!("argument {}: expected {}", index, expected))
    }

    fn slot(&self, index: usize, expected: &str) -> Result<&'a GuestValue, Thrown> {
        self.slots.get(index).ok_or_else(|| self.illegal(index, expected))
    }

    pub(crate) fn object(&self, index: usize) -> Result<GuestRef, Thrown> {
        match self.slot(index, "a reference")? {
            GuestValue::Ref(r) => Ok(r.clone()),
            _ => Err(self.illegal(index, "a reference")),
        }
    }

    fn non_null(&self, index: usize, what: &str) -> Result<GuestRef, Thrown> {
        let r = self.object(index)?;
        if r.is_null() {
            return Err(self.ctx.meta().throw(names().null_pointer, format!("{} is null", what)));
        }
        Ok(r)
    }

    fn boolean(&self, index: usize) -> Result<bool, Thrown> {
        self.slot(index, "boolean")?
            .as_boolean()
            .ok_or_else(|| self.illegal(index, "boolean"))
    }

    fn byte(&self, index: usize) -> Result<i8, Thrown> {
        match *self.slot(index, "byte")? {
            GuestValue::Byte(v) => Ok(v),
            _ => Err(self.illegal(index, "byte")),
        }
    }

    fn short(&self, index: usize) -> Result<i16, Thrown> {
        match *self.slot(index, "short")? {
            GuestValue::Short(v) => Ok(v),
            GuestValue::Byte(v) => Ok(i16::from(v)),
            _ => Err(self.illegal(index, "short")),
        }
    }

    pub(crate) fn int(&self, index: usize) -> Result<i32, Thrown> {
        self.slot(index, "int")?.as_int().ok_or_else(|| self.illegal(index, "int"))
    }

    fn long(&self, index: usize) -> Result<i64, Thrown> {
        self.slot(index, "long")?.as_long().ok_or_else(|| self.illegal(index, "long"))
    }

    fn float(&self, index: usize) -> Result<f32, Thrown> {
        match *self.slot(index, "float")? {
            GuestValue::Float(v) => Ok(v),
            _ => Err(self.illegal(index, "float")),
        }
    }

    fn double(&self, index: usize) -> Result<f64, Thrown> {
        match *self.slot(index, "double")? {
            GuestValue::Double(v) => Ok(v),
            GuestValue::Float(v) => Ok(f64::from(v)),
            _ => Err(self.illegal(index, "double")),
        }
    }

    fn string(&self, index: usize) -> Result<String, Thrown> {
        let r = self.non_null(index, "member name")?;
        match r.host_string() {
            Some(s) => Ok(s.to_string()),
            None => Err(self.illegal(index, "String")),
        }
    }

    fn order(&self, index: usize) -> Result<ByteOrder, Thrown> {
        let r = self.non_null(index, "byte order")?;
        self.ctx
            .meta()
            .byte_order_of(&r)
            .ok_or_else(|| self.illegal(index, "ByteOrder"))
    }

    fn objects(&self, index: usize) -> Result<Vec<GuestRef>, Thrown> {
        let r = self.non_null(index, "arguments")?;
        let Some(NativeData::Array(array)) = r.native_data() else {
            return Err(self.illegal(index, "Object[]"));
        };
        let result = array
            .elements()
            .read()
            .iter()
            .map(|v| v.as_ref().cloned().ok_or_else(|| self.illegal(index, "Object[]")))
            .collect();
        result
    }
}

// ============================================================================
// Result encoding
// ============================================================================

/// A message result as a guest slot
trait Reply {
    fn reply(self) -> Result<GuestValue, Thrown>;
}

macro_rules! impl_reply {
    ($($ty:ty),*) => {
        $(
            impl Reply for $ty {
                #[inline]
                fn reply(self) -> Result<GuestValue, Thrown> {
                    Ok(GuestValue::from(self))
                }
            }
        )*
    };
}

impl_reply!(bool, i8, i16, i32, i64, f32, f64, GuestRef);

impl Reply for () {
    #[inline]
    fn reply(self) -> Result<GuestValue, Thrown> {
        Ok(GuestValue::Void)
    }
}

impl<T: Reply> Reply for Result<T, Thrown> {
    #[inline]
    fn reply(self) -> Result<GuestValue, Thrown> {
        self?.reply()
    }
}

// ============================================================================
// Message table
// ============================================================================

macro_rules! messages {
    ($($variant:ident $name:literal [$($param:expr),*] $ret:expr => |$a:ident| $body:expr;)*) => {
        /// A static method of the guest `Interop` class
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum Message {
            $($variant,)*
        }

        impl Message {
            /// Every message, in declaration order
            pub const ALL: &'static [Message] = &[$(Message::$variant,)*];

            /// Guest method name
            pub fn name(self) -> &'static str {
                match self {
                    $(Message::$variant => $name,)*
                }
            }

            /// Declared parameter descriptors
            pub fn parameters(self) -> &'static [&'static str] {
                match self {
                    $(Message::$variant => &[$($param),*],)*
                }
            }

            /// Return type descriptor
            pub fn return_type(self) -> &'static str {
                match self {
                    $(Message::$variant => $ret,)*
                }
            }

            /// Send the message with guest arguments, in declaration order
            pub fn invoke(self, ctx: &InteropContext, args: &[GuestValue]) -> Result<GuestValue, Thrown> {
                match self {
                    $(
                        Message::$variant => {
                            let $a = Args::new(ctx, args);
                            Reply::reply($body)
                        }
                    )*
                }
            }
        }
    };
}

messages! {
    // null, boolean, string
    IsNull "isNull" [O] Z => |a| protocol::is_null(&a.object(0)?);
    IsBoolean "isBoolean" [O] Z => |a| protocol::is_boolean(&a.object(0)?);
    AsBoolean "asBoolean" [O] Z => |a| protocol::as_boolean(a.ctx, &a.object(0)?);
    IsString "isString" [O] Z => |a| protocol::is_string(&a.object(0)?);
    AsString "asString" [O] STR => |a| protocol::as_string(a.ctx, &a.object(0)?);

    // numbers
    IsNumber "isNumber" [O] Z => |a| protocol::is_number(&a.object(0)?);
    FitsInByte "fitsInByte" [O] Z => |a| protocol::fits_in_byte(&a.object(0)?);
    FitsInShort "fitsInShort" [O] Z => |a| protocol::fits_in_short(&a.object(0)?);
    FitsInInt "fitsInInt" [O] Z => |a| protocol::fits_in_int(&a.object(0)?);
    FitsInLong "fitsInLong" [O] Z => |a| protocol::fits_in_long(&a.object(0)?);
    FitsInFloat "fitsInFloat" [O] Z => |a| protocol::fits_in_float(&a.object(0)?);
    FitsInDouble "fitsInDouble" [O] Z => |a| protocol::fits_in_double(&a.object(0)?);
    FitsInBigInteger "fitsInBigInteger" [O] Z => |a| protocol::fits_in_big_integer(&a.object(0)?);
    AsByte "asByte" [O] B => |a| protocol::as_byte(a.ctx, &a.object(0)?);
    AsShort "asShort" [O] S => |a| protocol::as_short(a.ctx, &a.object(0)?);
    AsInt "asInt" [O] I => |a| protocol::as_int(a.ctx, &a.object(0)?);
    AsLong "asLong" [O] J => |a| protocol::as_long(a.ctx, &a.object(0)?);
    AsFloat "asFloat" [O] F => |a| protocol::as_float(a.ctx, &a.object(0)?);
    AsDouble "asDouble" [O] D => |a| protocol::as_double(a.ctx, &a.object(0)?);
    AsBigInteger "asBigInteger" [O] BIG => |a| protocol::as_big_integer(a.ctx, &a.object(0)?);

    // exceptions
    IsException "isException" [O] Z => |a| protocol::is_exception(&a.object(0)?);
    ThrowException "throwException" [O] RUNTIME_EXC => |a| {
        Err::<(), _>(protocol::throw_exception(a.ctx, &a.object(0)?))
    };
    GetExceptionType "getExceptionType" [O] EXC_TYPE => |a| protocol::get_exception_type(a.ctx, &a.object(0)?);
    IsExceptionIncompleteSource "isExceptionIncompleteSource" [O] Z => |a| {
        protocol::is_exception_incomplete_source(a.ctx, &a.object(0)?)
    };
    GetExceptionExitStatus "getExceptionExitStatus" [O] I => |a| {
        protocol::get_exception_exit_status(a.ctx, &a.object(0)?)
    };
    HasExceptionCause "hasExceptionCause" [O] Z => |a| protocol::has_exception_cause(&a.object(0)?);
    GetExceptionCause "getExceptionCause" [O] O => |a| protocol::get_exception_cause(a.ctx, &a.object(0)?);
    HasExceptionMessage "hasExceptionMessage" [O] Z => |a| protocol::has_exception_message(&a.object(0)?);
    GetExceptionMessage "getExceptionMessage" [O] O => |a| protocol::get_exception_message(a.ctx, &a.object(0)?);
    HasExceptionStackTrace "hasExceptionStackTrace" [O] Z => |a| protocol::has_exception_stack_trace(&a.object(0)?);
    GetExceptionStackTrace "getExceptionStackTrace" [O] O => |a| {
        protocol::get_exception_stack_trace(a.ctx, &a.object(0)?)
    };

    // arrays
    HasArrayElements "hasArrayElements" [O] Z => |a| protocol::has_array_elements(&a.object(0)?);
    GetArraySize "getArraySize" [O] J => |a| protocol::get_array_size(a.ctx, &a.object(0)?);
    ReadArrayElement "readArrayElement" [O, J] O => |a| {
        protocol::read_array_element(a.ctx, &a.object(0)?, a.long(1)?)
    };
    WriteArrayElement "writeArrayElement" [O, J, O] V => |a| {
        protocol::write_array_element(a.ctx, &a.object(0)?, a.long(1)?, &a.object(2)?)
    };
    RemoveArrayElement "removeArrayElement" [O, J] V => |a| {
        protocol::remove_array_element(a.ctx, &a.object(0)?, a.long(1)?)
    };
    IsArrayElementReadable "isArrayElementReadable" [O, J] Z => |a| {
        protocol::is_array_element_readable(&a.object(0)?, a.long(1)?)
    };
    IsArrayElementModifiable "isArrayElementModifiable" [O, J] Z => |a| {
        protocol::is_array_element_modifiable(&a.object(0)?, a.long(1)?)
    };
    IsArrayElementInsertable "isArrayElementInsertable" [O, J] Z => |a| {
        protocol::is_array_element_insertable(&a.object(0)?, a.long(1)?)
    };
    IsArrayElementRemovable "isArrayElementRemovable" [O, J] Z => |a| {
        protocol::is_array_element_removable(&a.object(0)?, a.long(1)?)
    };

    // meta objects
    HasMetaObject "hasMetaObject" [O] Z => |a| protocol::has_meta_object(&a.object(0)?);
    GetMetaObject "getMetaObject" [O] O => |a| protocol::get_meta_object(a.ctx, &a.object(0)?);
    IsMetaObject "isMetaObject" [O] Z => |a| protocol::is_meta_object(&a.object(0)?);
    GetMetaQualifiedName "getMetaQualifiedName" [O] O => |a| {
        protocol::get_meta_qualified_name(a.ctx, &a.object(0)?)
    };
    GetMetaSimpleName "getMetaSimpleName" [O] O => |a| protocol::get_meta_simple_name(a.ctx, &a.object(0)?);
    IsMetaInstance "isMetaInstance" [O, O] Z => |a| {
        protocol::is_meta_instance(a.ctx, &a.object(0)?, &a.object(1)?)
    };
    ToDisplayString "toDisplayString" [O] O => |a| protocol::to_display_string(a.ctx, &a.object(0)?, true);
    ToDisplayStringWithSideEffects "toDisplayString" [O, Z] O => |a| {
        protocol::to_display_string(a.ctx, &a.object(0)?, a.boolean(1)?)
    };

    // identity
    HasIdentity "hasIdentity" [O] Z => |a| protocol::has_identity(&a.object(0)?);
    IsIdentical "isIdentical" [O, O] Z => |a| protocol::is_identical(&a.object(0)?, &a.object(1)?);
    IdentityHashCode "identityHashCode" [O] I => |a| protocol::identity_hash_code(a.ctx, &a.object(0)?);

    // members
    HasMembers "hasMembers" [O] Z => |a| protocol::has_members(&a.object(0)?);
    GetMembers "getMembers" [O] O => |a| protocol::get_members(a.ctx, &a.object(0)?, false);
    GetMembersWithInternal "getMembers" [O, Z] O => |a| {
        protocol::get_members(a.ctx, &a.object(0)?, a.boolean(1)?)
    };
    IsMemberReadable "isMemberReadable" [O, STR] Z => |a| {
        protocol::is_member_readable(&a.object(0)?, &a.string(1)?)
    };
    IsMemberModifiable "isMemberModifiable" [O, STR] Z => |a| {
        protocol::is_member_modifiable(&a.object(0)?, &a.string(1)?)
    };
    IsMemberInsertable "isMemberInsertable" [O, STR] Z => |a| {
        protocol::is_member_insertable(&a.object(0)?, &a.string(1)?)
    };
    IsMemberRemovable "isMemberRemovable" [O, STR] Z => |a| {
        protocol::is_member_removable(&a.object(0)?, &a.string(1)?)
    };
    IsMemberInvocable "isMemberInvocable" [O, STR] Z => |a| {
        protocol::is_member_invocable(&a.object(0)?, &a.string(1)?)
    };
    IsMemberInternal "isMemberInternal" [O, STR] Z => |a| {
        protocol::is_member_internal(&a.object(0)?, &a.string(1)?)
    };
    HasMemberReadSideEffects "hasMemberReadSideEffects" [O, STR] Z => |a| {
        protocol::has_member_read_side_effects(&a.object(0)?, &a.string(1)?)
    };
    HasMemberWriteSideEffects "hasMemberWriteSideEffects" [O, STR] Z => |a| {
        protocol::has_member_write_side_effects(&a.object(0)?, &a.string(1)?)
    };
    ReadMember "readMember" [O, STR] O => |a| protocol::read_member(a.ctx, &a.object(0)?, &a.string(1)?);
    WriteMember "writeMember" [O, STR, O] V => |a| {
        protocol::write_member(a.ctx, &a.object(0)?, &a.string(1)?, &a.object(2)?)
    };
    RemoveMember "removeMember" [O, STR] V => |a| protocol::remove_member(a.ctx, &a.object(0)?, &a.string(1)?);
    InvokeMember "invokeMember" [O, STR, OBJS] O => |a| {
        protocol::invoke_member(a.ctx, &a.object(0)?, &a.string(1)?, &a.objects(2)?)
    };

    // pointers
    IsPointer "isPointer" [O] Z => |a| protocol::is_pointer(&a.object(0)?);
    AsPointer "asPointer" [O] J => |a| protocol::as_pointer(a.ctx, &a.object(0)?);
    ToNative "toNative" [O] V => |a| protocol::to_native(&a.object(0)?);

    // executables
    IsExecutable "isExecutable" [O] Z => |a| protocol::is_executable(&a.object(0)?);
    Execute "execute" [O, OBJS] O => |a| protocol::execute(a.ctx, &a.object(0)?, &a.objects(1)?);
    IsInstantiable "isInstantiable" [O] Z => |a| protocol::is_instantiable(&a.object(0)?);
    Instantiate "instantiate" [O, OBJS] O => |a| protocol::instantiate(a.ctx, &a.object(0)?, &a.objects(1)?);
    HasExecutableName "hasExecutableName" [O] Z => |a| protocol::has_executable_name(&a.object(0)?);
    GetExecutableName "getExecutableName" [O] O => |a| protocol::get_executable_name(a.ctx, &a.object(0)?);
    HasDeclaringMetaObject "hasDeclaringMetaObject" [O] Z => |a| {
        protocol::has_declaring_meta_object(&a.object(0)?)
    };
    GetDeclaringMetaObject "getDeclaringMetaObject" [O] O => |a| {
        protocol::get_declaring_meta_object(a.ctx, &a.object(0)?)
    };

    // buffers
    HasBufferElements "hasBufferElements" [O] Z => |a| protocol::has_buffer_elements(&a.object(0)?);
    IsBufferWritable "isBufferWritable" [O] Z => |a| protocol::is_buffer_writable(a.ctx, &a.object(0)?);
    GetBufferSize "getBufferSize" [O] J => |a| protocol::get_buffer_size(a.ctx, &a.object(0)?);
    ReadBufferByte "readBufferByte" [O, J] B => |a| protocol::read_buffer_byte(a.ctx, &a.object(0)?, a.long(1)?);
    WriteBufferByte "writeBufferByte" [O, J, B] V => |a| {
        protocol::write_buffer_byte(a.ctx, &a.object(0)?, a.long(1)?, a.byte(2)?)
    };
    ReadBufferShort "readBufferShort" [O, ORDER, J] S => |a| {
        protocol::read_buffer_short(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?)
    };
    WriteBufferShort "writeBufferShort" [O, ORDER, J, S] V => |a| {
        protocol::write_buffer_short(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?, a.short(3)?)
    };
    ReadBufferInt "readBufferInt" [O, ORDER, J] I => |a| {
        protocol::read_buffer_int(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?)
    };
    WriteBufferInt "writeBufferInt" [O, ORDER, J, I] V => |a| {
        protocol::write_buffer_int(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?, a.int(3)?)
    };
    ReadBufferLong "readBufferLong" [O, ORDER, J] J => |a| {
        protocol::read_buffer_long(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?)
    };
    WriteBufferLong "writeBufferLong" [O, ORDER, J, J] V => |a| {
        protocol::write_buffer_long(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?, a.long(3)?)
    };
    ReadBufferFloat "readBufferFloat" [O, ORDER, J] F => |a| {
        protocol::read_buffer_float(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?)
    };
    WriteBufferFloat "writeBufferFloat" [O, ORDER, J, F] V => |a| {
        protocol::write_buffer_float(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?, a.float(3)?)
    };
    ReadBufferDouble "readBufferDouble" [O, ORDER, J] D => |a| {
        protocol::read_buffer_double(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?)
    };
    WriteBufferDouble "writeBufferDouble" [O, ORDER, J, D] V => |a| {
        protocol::write_buffer_double(a.ctx, &a.object(0)?, a.order(1)?, a.long(2)?, a.double(3)?)
    };

    // iterators
    HasIterator "hasIterator" [O] Z => |a| protocol::has_iterator(&a.object(0)?);
    GetIterator "getIterator" [O] O => |a| protocol::get_iterator(a.ctx, &a.object(0)?);
    IsIterator "isIterator" [O] Z => |a| protocol::is_iterator(&a.object(0)?);
    HasIteratorNextElement "hasIteratorNextElement" [O] Z => |a| {
        protocol::has_iterator_next_element(a.ctx, &a.object(0)?)
    };
    GetIteratorNextElement "getIteratorNextElement" [O] O => |a| {
        protocol::get_iterator_next_element(a.ctx, &a.object(0)?)
    };

    // hash entries
    HasHashEntries "hasHashEntries" [O] Z => |a| protocol::has_hash_entries(&a.object(0)?);
    GetHashSize "getHashSize" [O] J => |a| protocol::get_hash_size(a.ctx, &a.object(0)?);
    IsHashEntryReadable "isHashEntryReadable" [O, O] Z => |a| {
        protocol::is_hash_entry_readable(&a.object(0)?, &a.object(1)?)
    };
    IsHashEntryModifiable "isHashEntryModifiable" [O, O] Z => |a| {
        protocol::is_hash_entry_modifiable(&a.object(0)?, &a.object(1)?)
    };
    IsHashEntryInsertable "isHashEntryInsertable" [O, O] Z => |a| {
        protocol::is_hash_entry_insertable(&a.object(0)?, &a.object(1)?)
    };
    IsHashEntryWritable "isHashEntryWritable" [O, O] Z => |a| {
        protocol::is_hash_entry_writable(&a.object(0)?, &a.object(1)?)
    };
    IsHashEntryRemovable "isHashEntryRemovable" [O, O] Z => |a| {
        protocol::is_hash_entry_removable(&a.object(0)?, &a.object(1)?)
    };
    IsHashEntryExisting "isHashEntryExisting" [O, O] Z => |a| {
        protocol::is_hash_entry_existing(&a.object(0)?, &a.object(1)?)
    };
    ReadHashValue "readHashValue" [O, O] O => |a| protocol::read_hash_value(a.ctx, &a.object(0)?, &a.object(1)?);
    ReadHashValueOrDefault "readHashValueOrDefault" [O, O, O] O => |a| {
        protocol::read_hash_value_or_default(a.ctx, &a.object(0)?, &a.object(1)?, &a.object(2)?)
    };
    WriteHashEntry "writeHashEntry" [O, O, O] V => |a| {
        protocol::write_hash_entry(a.ctx, &a.object(0)?, &a.object(1)?, &a.object(2)?)
    };
    RemoveHashEntry "removeHashEntry" [O, O] V => |a| {
        protocol::remove_hash_entry(a.ctx, &a.object(0)?, &a.object(1)?)
    };
    GetHashEntriesIterator "getHashEntriesIterator" [O] O => |a| {
        protocol::get_hash_entries_iterator(a.ctx, &a.object(0)?)
    };
    GetHashKeysIterator "getHashKeysIterator" [O] O => |a| protocol::get_hash_keys_iterator(a.ctx, &a.object(0)?);
    GetHashValuesIterator "getHashValuesIterator" [O] O => |a| {
        protocol::get_hash_values_iterator(a.ctx, &a.object(0)?)
    };
}

impl Message {
    /// Raw method descriptor, e.g. `(Ljava/lang/Object;J)Ljava/lang/Object;`
    pub fn signature(self) -> Symbol {
        signature_of(self.parameters(), self.return_type())
    }

    /// The message a guest method of `Interop` stands for
    pub fn lookup(name: &str, signature: &str) -> Option<Message> {
        Message::ALL
            .iter()
            .copied()
            .find(|m| m.name() == name && m.signature().as_str() == signature)
    }
}
