//! Synthetic personal names
//!
//! A name is a surname followed by a one- or two-character given name drawn
//! from per-sex character tables.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::Sex;

pub const SURNAMES: &[&str] = &[
    "王", "李", "张", "刘", "陈", "杨", "黄", "赵", "吴", "周", "徐", "孙", "马", "朱", "胡",
    "郭", "何", "高", "林", "罗", "郑", "梁", "谢", "宋", "唐", "许", "韩", "冯", "邓", "曹",
    "彭", "曾", "肖", "田", "董", "袁", "潘", "于", "蒋", "蔡", "余", "杜", "叶", "程", "苏",
    "魏", "吕", "丁", "任", "沈", "欧阳", "司马", "诸葛",
];

pub const MALE_ONE_CHAR: &[&str] = &[
    "伟", "强", "磊", "军", "洋", "勇", "杰", "涛", "明", "超", "刚", "平", "辉", "鹏", "华",
    "飞", "鑫", "波", "斌", "宇", "浩", "凯", "健", "俊", "帆", "帅", "旭", "宁", "龙", "林",
];

pub const MALE_TWO_CHARS: &[&str] = &[
    "建华", "建国", "志强", "志明", "俊杰", "浩然", "子轩", "宇航", "文博", "天佑", "明轩",
    "博文", "晓东", "国强", "永刚", "海涛", "立新", "振宇", "家豪", "思远", "嘉懿", "一鸣",
];

pub const FEMALE_ONE_CHAR: &[&str] = &[
    "芳", "娜", "敏", "静", "丽", "艳", "娟", "霞", "燕", "玲", "婷", "雪", "慧", "颖", "琳",
    "洁", "倩", "萍", "红", "梅", "莉", "兰", "月", "瑶", "欣", "悦", "蕾", "薇", "晶", "妍",
];

pub const FEMALE_TWO_CHARS: &[&str] = &[
    "秀英", "桂英", "秀兰", "玉兰", "丽娟", "婷婷", "欣怡", "梓涵", "诗涵", "雨桐", "可馨",
    "思琪", "佳怡", "晓燕", "美玲", "雅静", "子涵", "梦瑶", "紫萱", "雨欣", "嘉怡", "若曦",
];

/// Generate a random full name for the given sex
pub fn generate_name<R: Rng + ?Sized>(rng: &mut R, sex: Sex) -> String {
    let surname = SURNAMES.choose(rng).copied().unwrap_or("王");

    let two_chars = rng.random_bool(0.5);
    let pool = match (sex, two_chars) {
        (Sex::Male, true) => MALE_TWO_CHARS,
        (Sex::Male, false) => MALE_ONE_CHAR,
        (Sex::Female, true) => FEMALE_TWO_CHARS,
        (Sex::Female, false) => FEMALE_ONE_CHAR,
    };
    let given = pool.choose(rng).copied().unwrap_or_default();

    format!("{surname}{given}")
}
