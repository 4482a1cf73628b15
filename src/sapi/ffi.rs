//! PHP FFI bindings for the phptoro embedding.
//!
//! This module provides manual FFI bindings to PHP's C API.
//! Struct layouts follow PHP 8.4 (NTS by default, ZTS with the `zts` feature).

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]
#![allow(non_snake_case)]

use std::ffi::{c_char, c_int, c_uint, c_void};
use std::ptr;

// ============================================================================
// Basic Types
// ============================================================================

pub type zend_result = c_int;
pub type zend_long = i64;
pub type zend_ulong = u64;

#[cfg(unix)]
pub type zend_stat_t = libc::stat;

// ============================================================================
// Zend Types
// ============================================================================

/// zend_refcounted_h - Reference counting header
#[repr(C)]
pub struct zend_refcounted_h {
    pub refcount: u32,
    pub type_info: u32,
}

/// zend_string - PHP string
#[repr(C)]
pub struct zend_string {
    pub gc: zend_refcounted_h,
    pub h: zend_ulong,
    pub len: usize,
    pub val: [c_char; 1], // Flexible array member
}

/// Offset of `val` inside zend_string (`_ZSTR_HEADER_SIZE`).
pub const ZSTR_HEADER_SIZE: usize = std::mem::offset_of!(zend_string, val);

/// HashTable - PHP array (opaque)
#[repr(C)]
pub struct HashTable {
    _data: [u8; 56], // Opaque - don't access internals
}

/// zval_value - Union of possible zval values
#[repr(C)]
pub union zval_value {
    pub lval: zend_long,
    pub dval: f64,
    pub counted: *mut zend_refcounted_h,
    pub str_: *mut zend_string,
    pub arr: *mut HashTable,
    pub obj: *mut c_void,
    pub ptr: *mut c_void,
    pub func: *mut zend_internal_function,
}

/// zval - PHP value container
#[repr(C)]
pub struct zval {
    pub value: zval_value,
    pub u1: zval_u1,
    pub u2: zval_u2,
}

#[repr(C)]
pub union zval_u1 {
    pub type_info: u32,
    pub v: zval_v,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct zval_v {
    pub type_: u8,
    pub type_flags: u8,
    pub extra: u16,
}

#[repr(C)]
pub union zval_u2 {
    pub next: u32,
    pub num_args: u32,
    pub extra: u32,
}

// zval type constants
pub const IS_UNDEF: u32 = 0;
pub const IS_NULL: u32 = 1;
pub const IS_FALSE: u32 = 2;
pub const IS_TRUE: u32 = 3;
pub const IS_STRING: u32 = 6;

/// IS_STRING | (IS_TYPE_REFCOUNTED << Z_TYPE_FLAGS_SHIFT)
pub const IS_STRING_EX: u32 = IS_STRING | (1 << 8);

/// GC type info of a fresh request-bound string (IS_STRING | GC_NOT_COLLECTABLE).
pub const GC_STRING: u32 = IS_STRING | (1 << 4);

// MAY_BE_* type masks (1 << IS_*)
pub const MAY_BE_NULL: u32 = 1 << IS_NULL;
pub const MAY_BE_FALSE: u32 = 1 << IS_FALSE;
pub const MAY_BE_STRING: u32 = 1 << IS_STRING;

/// zend_execute_data - Execution context (opaque)
#[repr(C)]
pub struct zend_execute_data {
    _data: [u8; 128], // Opaque - accessed via helpers below
}

// ============================================================================
// SAPI Structures
// ============================================================================

/// sapi_header_struct - Individual HTTP header
#[repr(C)]
pub struct sapi_header_struct {
    pub header: *mut c_char,
    pub header_len: usize,
}

/// sapi_header_op_enum - Header operation types
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum sapi_header_op_enum {
    SAPI_HEADER_REPLACE = 0,
    SAPI_HEADER_ADD = 1,
    SAPI_HEADER_DELETE = 2,
    SAPI_HEADER_DELETE_PREFIX = 3,
    SAPI_HEADER_DELETE_ALL = 4,
    SAPI_HEADER_SET_STATUS = 5,
}

/// sapi_headers_struct - Response headers collection (opaque tail)
#[repr(C)]
pub struct sapi_headers_struct {
    _data: [u8; 96],
}

/// sapi_module_struct - SAPI module definition
#[repr(C)]
pub struct sapi_module_struct {
    pub name: *mut c_char,
    pub pretty_name: *mut c_char,

    pub startup: Option<unsafe extern "C" fn(*mut sapi_module_struct) -> c_int>,
    pub shutdown: Option<unsafe extern "C" fn(*mut sapi_module_struct) -> c_int>,

    pub activate: Option<unsafe extern "C" fn() -> c_int>,
    pub deactivate: Option<unsafe extern "C" fn() -> c_int>,

    pub ub_write: Option<unsafe extern "C" fn(*const c_char, usize) -> usize>,
    pub flush: Option<unsafe extern "C" fn(*mut c_void)>,
    pub get_stat: Option<unsafe extern "C" fn() -> *mut zend_stat_t>,
    pub getenv: Option<unsafe extern "C" fn(*const c_char, usize) -> *mut c_char>,

    pub sapi_error: *mut c_void, // Variadic function pointer
    pub header_handler: Option<
        unsafe extern "C" fn(
            *mut sapi_header_struct,
            sapi_header_op_enum,
            *mut sapi_headers_struct,
        ) -> c_int,
    >,
    pub send_headers: Option<unsafe extern "C" fn(*mut sapi_headers_struct) -> c_int>,
    pub send_header: Option<unsafe extern "C" fn(*mut sapi_header_struct, *mut c_void)>,

    pub read_post: Option<unsafe extern "C" fn(*mut c_char, usize) -> usize>,
    pub read_cookies: Option<unsafe extern "C" fn() -> *mut c_char>,

    pub register_server_variables: Option<unsafe extern "C" fn(*mut zval)>,
    pub log_message: Option<unsafe extern "C" fn(*const c_char, c_int)>,
    pub get_request_time: Option<unsafe extern "C" fn(*mut f64) -> zend_result>,
    pub terminate_process: Option<unsafe extern "C" fn()>,

    // STANDARD_SAPI_MODULE_PROPERTIES
    pub php_ini_path_override: *mut c_char,
    pub default_post_reader: Option<unsafe extern "C" fn()>,
    pub treat_data: Option<unsafe extern "C" fn(c_int, *mut c_char, *mut zval)>,
    pub executable_location: *mut c_char,

    pub php_ini_ignore: c_int,
    pub php_ini_ignore_cwd: c_int,

    pub get_fd: Option<unsafe extern "C" fn(*mut c_int) -> c_int>,
    pub force_http_10: Option<unsafe extern "C" fn() -> c_int>,
    pub get_target_uid: Option<unsafe extern "C" fn(*mut libc::uid_t) -> c_int>,
    pub get_target_gid: Option<unsafe extern "C" fn(*mut libc::gid_t) -> c_int>,

    pub input_filter: Option<
        unsafe extern "C" fn(c_int, *const c_char, *mut *mut c_char, usize, *mut usize) -> c_uint,
    >,

    pub ini_defaults: Option<unsafe extern "C" fn(*mut HashTable)>,
    pub phpinfo_as_text: c_int,

    pub ini_entries: *const c_char,
    pub additional_functions: *const zend_function_entry,
    pub input_filter_init: Option<unsafe extern "C" fn() -> c_uint>,
}

// ============================================================================
// Function Entry (for registering PHP functions)
// ============================================================================

/// Type alias for PHP internal function handler
pub type zif_handler = Option<unsafe extern "C" fn(*mut zend_execute_data, *mut zval)>;

/// zend_type - PHP 8.x type information (16 bytes on 64-bit)
#[repr(C)]
#[derive(Copy, Clone)]
pub struct zend_type {
    pub ptr: *mut c_void, // type_list for complex types
    pub type_mask: u32,   // MAY_BE_* flags
    _padding: u32,        // alignment padding
}

impl zend_type {
    /// Create a type from a MAY_BE_* mask.
    pub const fn mask(type_mask: u32) -> Self {
        Self {
            ptr: ptr::null_mut(),
            type_mask,
            _padding: 0,
        }
    }
}

/// zend_internal_arg_info - Argument info for internal functions
///
/// For the first element (return type info):
/// - `name` contains `(uintptr_t)required_num_args` cast to pointer
/// - `type_` contains return type info
///
/// For subsequent elements (argument info):
/// - `name` is the argument name
/// - `type_` is the argument type info
/// - `default_value` is the default as PHP source text (for reflection)
#[repr(C)]
pub struct zend_internal_arg_info {
    pub name: *const c_char,
    pub type_: zend_type,
    pub default_value: *const c_char,
}

impl zend_internal_arg_info {
    /// Return-info element: N required arguments and a return type mask.
    pub const fn returns(required: usize, type_mask: u32) -> Self {
        Self {
            name: required as *const c_char,
            type_: zend_type::mask(type_mask),
            default_value: ptr::null(),
        }
    }

    /// Argument element with an optional default expression.
    pub const fn arg(name: *const c_char, type_mask: u32, default_value: *const c_char) -> Self {
        Self {
            name,
            type_: zend_type::mask(type_mask),
            default_value,
        }
    }
}

// SAFETY: zend_internal_arg_info is immutable static data
unsafe impl Sync for zend_internal_arg_info {}

/// zend_function_entry - Function registration entry
#[repr(C)]
pub struct zend_function_entry {
    pub fname: *const c_char,
    pub handler: zif_handler,
    pub arg_info: *const zend_internal_arg_info,
    pub num_args: u32,
    pub flags: u32,
    pub frameless_function_infos: *const c_void,
    pub doc_comment: *const c_char,
}

// Null terminator for function entry arrays
impl zend_function_entry {
    pub const NULL: Self = Self {
        fname: ptr::null(),
        handler: None,
        arg_info: ptr::null(),
        num_args: 0,
        flags: 0,
        frameless_function_infos: ptr::null(),
        doc_comment: ptr::null(),
    };
}

// SAFETY: zend_function_entry is immutable static data holding pointers to
// static strings; PHP only reads it during module startup.
unsafe impl Sync for zend_function_entry {}

// ============================================================================
// Internal Functions (symbol table entries)
// ============================================================================

pub const ZEND_INTERNAL_FUNCTION: u8 = 1;

const ZEND_MAX_RESERVED_RESOURCES: usize = 6;

/// zend_internal_function - the `internal_function` arm of `zend_function`.
///
/// `type_` is shared with every arm of the union, so reading it through this
/// view is valid for user functions too.
#[repr(C)]
pub struct zend_internal_function {
    // Common elements
    pub type_: u8,
    pub arg_flags: [u8; 3],
    pub fn_flags: u32,
    pub function_name: *mut zend_string,
    pub scope: *mut c_void,
    pub prototype: *mut c_void,
    pub num_args: u32,
    pub required_num_args: u32,
    pub arg_info: *mut zend_internal_arg_info,
    pub attributes: *mut HashTable,
    pub run_time_cache: *mut c_void,
    pub doc_comment: *mut zend_string,
    pub T: u32,
    pub prop_info: *const c_void,
    // END of common elements
    pub handler: zif_handler,
    pub module: *mut c_void,
    pub frameless_function_infos: *const c_void,
    pub reserved: [*mut c_void; ZEND_MAX_RESERVED_RESOURCES],
}

// ============================================================================
// Compiler Globals (leading fields only)
// ============================================================================

#[repr(C)]
pub struct zend_stack {
    pub size: c_int,
    pub top: c_int,
    pub max: c_int,
    pub elements: *mut c_void,
}

/// Prefix of zend_compiler_globals, up to `function_table`.
///
/// Only ever accessed through a pointer into PHP's own storage.
#[repr(C)]
pub struct zend_compiler_globals {
    pub loop_var_stack: zend_stack,
    pub active_class_entry: *mut c_void,
    pub compiled_filename: *mut zend_string,
    pub zend_lineno: c_int,
    pub active_op_array: *mut c_void,
    pub function_table: *mut HashTable,
}

// ============================================================================
// File Handle (for script execution)
// ============================================================================

/// zend_file_handle - File handle for script execution
#[repr(C)]
pub struct zend_file_handle {
    pub handle: zend_file_handle_union,
    pub filename: *const zend_string,
    pub opened_path: *mut zend_string,
    pub type_: u8,
    pub primary_script: bool,
    pub in_list: bool,
    pub buf: *mut c_char,
    pub len: usize,
}

#[repr(C)]
pub union zend_file_handle_union {
    pub fp: *mut libc::FILE,
    pub stream: zend_stream,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct zend_stream {
    pub handle: *mut c_void,
    pub isatty: c_int,
    pub reader: *mut c_void,
    pub fsizer: *mut c_void,
    pub closer: *mut c_void,
}

// ============================================================================
// Constants
// ============================================================================

pub const SUCCESS: c_int = 0;

pub const SAPI_HEADER_SENT_SUCCESSFULLY: c_int = 1;

/// E_WARNING error level
pub const E_WARNING: c_int = 1 << 1;

/// PHP_INFO_ALL flag for php_print_info()
pub const PHP_INFO_ALL: zend_long = 0xFFFF_FFFF;

// ============================================================================
// External PHP Functions
// ============================================================================

#[link(name = "php")]
extern "C" {
    // TSRM startup (required for ZTS builds before sapi_startup)
    #[cfg(feature = "zts")]
    pub fn php_tsrm_startup() -> bool;

    // The interpreter's SAPI module; sapi_startup() copies into it
    pub static mut sapi_module: sapi_module_struct;

    // SAPI lifecycle
    pub fn sapi_startup(sf: *mut sapi_module_struct);
    pub fn sapi_shutdown();

    // Module lifecycle
    pub fn php_module_startup(
        sf: *mut sapi_module_struct,
        additional_module: *mut c_void,
    ) -> zend_result;
    pub fn php_module_shutdown();

    // Request lifecycle
    pub fn php_request_startup() -> zend_result;
    pub fn php_request_shutdown(dummy: *mut c_void);

    // Script execution
    pub fn php_execute_script(primary_file: *mut zend_file_handle) -> bool;

    // File handle
    pub fn zend_stream_init_filename(handle: *mut zend_file_handle, filename: *const c_char);
    pub fn zend_destroy_file_handle(handle: *mut zend_file_handle);

    // Variable registration
    pub fn php_register_variable_safe(
        var: *const c_char,
        val: *const c_char,
        val_len: usize,
        track_vars_array: *mut zval,
    );

    // Hash table lookup (returns the bucket zval, or NULL)
    pub fn zend_hash_str_find(ht: *const HashTable, key: *const c_char, len: usize) -> *mut zval;

    // Request-bound allocator (release builds: no file/line arguments)
    pub fn _emalloc(size: usize) -> *mut c_void;

    // Value destruction
    pub fn zval_ptr_dtor(zval_ptr: *mut zval);

    // Output buffering
    pub fn php_output_start_default() -> c_int;
    pub fn php_output_get_contents(p: *mut zval) -> c_int;
    pub fn php_output_discard() -> c_int;
    pub fn php_output_write(str: *const c_char, len: usize) -> usize;

    // phpinfo() report body
    pub fn php_print_info(flag: c_int);

    // Parameter parsing
    pub fn zend_parse_parameters(num_args: u32, type_spec: *const c_char, ...) -> zend_result;

    // Errors
    pub fn php_error_docref(docref: *const c_char, type_: c_int, format: *const c_char, ...);

    // Globals (NTS)
    #[cfg(not(feature = "zts"))]
    pub static mut compiler_globals: zend_compiler_globals;

    // Globals (ZTS - accessed via offset)
    #[cfg(feature = "zts")]
    pub fn ts_resource_ex(id: c_int, th_id: *mut c_void) -> *mut c_void;
    #[cfg(feature = "zts")]
    pub static compiler_globals_offset: usize;
}

// ============================================================================
// Globals Access
// ============================================================================

/// Get the interpreter's global function table (`CG(function_table)`).
///
/// # Safety
/// PHP module startup must have completed.
#[cfg(not(feature = "zts"))]
pub unsafe fn function_table() -> *mut HashTable {
    (*(&raw mut compiler_globals)).function_table
}

/// Get the interpreter's global function table (`CG(function_table)`).
///
/// # Safety
/// Must be called from a PHP thread after TSRM initialization and module startup.
#[cfg(feature = "zts")]
pub unsafe fn function_table() -> *mut HashTable {
    let base = ts_resource_ex(0, ptr::null_mut()) as *mut u8;
    if base.is_null() {
        return ptr::null_mut();
    }
    let cg = base.add(compiler_globals_offset) as *mut zend_compiler_globals;
    (*cg).function_table
}

// ============================================================================
// Helper Functions
// ============================================================================

impl zval {
    /// Create a new UNDEF zval
    pub const fn undef() -> Self {
        Self {
            value: zval_value { lval: 0 },
            u1: zval_u1 {
                type_info: IS_UNDEF,
            },
            u2: zval_u2 { extra: 0 },
        }
    }

    /// Set zval to bool value
    pub fn set_bool(&mut self, val: bool) {
        self.u1.type_info = if val { IS_TRUE } else { IS_FALSE };
    }

    /// Set zval to a freshly allocated string (ZVAL_NEW_STR)
    pub fn set_new_str(&mut self, s: *mut zend_string) {
        self.value.str_ = s;
        self.u1.type_info = IS_STRING_EX;
    }

    /// Get type info
    pub fn type_info(&self) -> u32 {
        unsafe { self.u1.type_info }
    }

    /// Get the type byte (Z_TYPE)
    pub fn type_(&self) -> u32 {
        self.type_info() & 0xff
    }

    /// Borrow the bytes of a string zval.
    ///
    /// # Safety
    /// `self` must hold a live string.
    pub unsafe fn as_bytes(&self) -> &[u8] {
        let s = self.value.str_;
        std::slice::from_raw_parts((*s).val.as_ptr() as *const u8, (*s).len)
    }
}

/// Allocate a request-bound zend_string holding a copy of `bytes`.
///
/// Mirrors `zend_string_init(bytes, len, 0)`, which is inline in the headers
/// and therefore not exported by libphp.
///
/// # Safety
/// Must be called while a PHP request is active.
pub unsafe fn new_zend_string(bytes: &[u8]) -> *mut zend_string {
    // ZEND_MM_ALIGNED_SIZE(_ZSTR_STRUCT_SIZE(len))
    let size = (ZSTR_HEADER_SIZE + bytes.len() + 1 + 7) & !7;
    let s = _emalloc(size) as *mut zend_string;

    (*s).gc.refcount = 1;
    (*s).gc.type_info = GC_STRING;
    (*s).h = 0;
    (*s).len = bytes.len();

    let val = (*s).val.as_mut_ptr() as *mut u8;
    ptr::copy_nonoverlapping(bytes.as_ptr(), val, bytes.len());
    *val.add(bytes.len()) = 0;
    s
}

// ============================================================================
// Execute Data Access
// ============================================================================

/// Get the number of arguments passed to the current function.
///
/// This reads from EX(This).u2.num_args which is at a fixed offset
/// in the execute_data structure.
///
/// # Safety
/// Must be called from within a PHP internal function with valid execute_data.
pub unsafe fn get_num_args(execute_data: *const zend_execute_data) -> u32 {
    if execute_data.is_null() {
        return 0;
    }
    // This is at offset 32 in zend_execute_data (opline, call, return_value, func),
    // u2 is at offset 12 within zval (after value union (8) + u1 (4))
    let ptr = (execute_data as *const u8).add(44) as *const u32;
    *ptr
}
