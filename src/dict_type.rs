//! Type descriptors: the pluggable behavior a dictionary delegates to.
//!
//! A descriptor is a type-level record of callbacks. Every callback receives
//! the dictionary's context (the value passed to [`Dict::new`]), which is
//! where per-dictionary state such as a hash seed or a `BuildHasher` lives.
//!
//! Only [`DictType::hash`] is required. Duplication defaults to storing the
//! value as given, comparison defaults to `Eq`, and destruction defaults to
//! dropping.
//!
//! [`Dict::new`]: crate::Dict::new

use crate::hash::{case_hash, int_hash, murmur2};
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::hash_map::DefaultHashBuilder;

/// Callbacks used by a [`Dict`](crate::Dict) to hash, copy, compare and
/// destroy its keys and values.
///
/// Callbacks must not fail; a callback that needs to report a problem has to
/// do so out of band (for example through state kept in the context).
pub trait DictType {
    type Key: Eq;
    type Value;
    type Context;

    fn hash(ctx: &Self::Context, key: &Self::Key) -> u64;

    /// Transforms a key on its way into the dictionary.
    #[inline]
    fn key_dup(_ctx: &Self::Context, key: Self::Key) -> Self::Key {
        key
    }

    /// Transforms a value on its way into the dictionary.
    #[inline]
    fn val_dup(_ctx: &Self::Context, value: Self::Value) -> Self::Value {
        value
    }

    #[inline]
    fn key_compare(_ctx: &Self::Context, a: &Self::Key, b: &Self::Key) -> bool {
        a == b
    }

    #[inline]
    fn key_destroy(_ctx: &Self::Context, key: Self::Key) {
        drop(key);
    }

    #[inline]
    fn val_destroy(_ctx: &Self::Context, value: Self::Value) {
        drop(value);
    }
}

/// Descriptor for any `K: Hash + Eq`, hashing through a `BuildHasher` held as
/// the context.
pub struct StdType<K, V, S = DefaultHashBuilder>(PhantomData<fn() -> (K, V, S)>);

impl<K, V, S> DictType for StdType<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Key = K;
    type Value = V;
    type Context = S;

    #[inline]
    fn hash(ctx: &S, key: &K) -> u64 {
        ctx.hash_one(key)
    }
}

/// String keys compared and hashed without regard to ASCII case, the way
/// command tables are usually looked up. The context is the hash seed.
pub struct CaseInsensitiveType<V>(PhantomData<fn() -> V>);

impl<V> DictType for CaseInsensitiveType<V> {
    type Key = String;
    type Value = V;
    type Context = u32;

    fn hash(seed: &u32, key: &String) -> u64 {
        case_hash(key.as_bytes(), *seed) as u64
    }

    fn key_compare(_seed: &u32, a: &String, b: &String) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

/// Binary-safe byte string keys hashed with MurmurHash2. The context is the
/// hash seed.
pub struct BytesType<V>(PhantomData<fn() -> V>);

impl<V> DictType for BytesType<V> {
    type Key = Vec<u8>;
    type Value = V;
    type Context = u32;

    fn hash(seed: &u32, key: &Vec<u8>) -> u64 {
        murmur2(key, *seed) as u64
    }

    // stored keys never carry spare capacity
    fn key_dup(_seed: &u32, mut key: Vec<u8>) -> Vec<u8> {
        key.shrink_to_fit();
        key
    }
}

/// 32 bit integer keys mixed with Thomas Wang's function.
pub struct IntType<V>(PhantomData<fn() -> V>);

impl<V> DictType for IntType<V> {
    type Key = u32;
    type Value = V;
    type Context = ();

    #[inline]
    fn hash(_ctx: &(), key: &u32) -> u64 {
        int_hash(*key) as u64
    }
}
