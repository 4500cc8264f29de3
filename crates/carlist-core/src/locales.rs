//! City codes used in listing URLs and their display names.

/// Default crawl order: tier-1 cities first, then new tier-1, tier-2, and a
/// tail of smaller markets so large targets can still be met.
pub const DEFAULT_LOCALES: &[&str] = &[
    "bj", "sh", "gz", "sz", //
    "hz", "nj", "wh", "cd", "xa", "cq", "tj", "qd", "dl", "su", //
    "dg", "fs", "zz", "cs", "jn", "hf", "sy", "cc", "hrb", "nb", "wx", "tz", //
    "km", "lz", "urumqi", "gy", "nn", "hk", "sjz", "taiyuan", "hohhot", "changchun",
];

const LOCALE_NAMES: &[(&str, &str)] = &[
    ("beijing", "北京"),
    ("bj", "北京"),
    ("shanghai", "上海"),
    ("sh", "上海"),
    ("guangzhou", "广州"),
    ("gz", "广州"),
    ("shenzhen", "深圳"),
    ("sz", "深圳"),
    ("hangzhou", "杭州"),
    ("hz", "杭州"),
    ("nanjing", "南京"),
    ("nj", "南京"),
    ("wuhan", "武汉"),
    ("wh", "武汉"),
    ("chengdu", "成都"),
    ("cd", "成都"),
    ("xian", "西安"),
    ("xa", "西安"),
    ("chongqing", "重庆"),
    ("cq", "重庆"),
    ("tianjin", "天津"),
    ("tj", "天津"),
    ("qingdao", "青岛"),
    ("qd", "青岛"),
    ("dalian", "大连"),
    ("dl", "大连"),
    ("suzhou", "苏州"),
    ("su", "苏州"),
    ("dongguan", "东莞"),
    ("dg", "东莞"),
    ("foshan", "佛山"),
    ("fs", "佛山"),
    ("zhengzhou", "郑州"),
    ("zz", "郑州"),
    ("changsha", "长沙"),
    ("cs", "长沙"),
    ("jinan", "济南"),
    ("jn", "济南"),
    ("hefei", "合肥"),
    ("hf", "合肥"),
    ("shenyang", "沈阳"),
    ("sy", "沈阳"),
    ("changchun", "长春"),
    ("cc", "长春"),
    ("harbin", "哈尔滨"),
    ("hrb", "哈尔滨"),
    ("taiyuan", "太原"),
    ("ty", "太原"),
    ("taizhou", "台州"),
    ("tz", "台州"),
    ("ningbo", "宁波"),
    ("nb", "宁波"),
    ("wuxi", "无锡"),
    ("wx", "无锡"),
    ("changzhou", "常州"),
    ("xuzhou", "徐州"),
    ("yantai", "烟台"),
    ("weifang", "潍坊"),
    ("linyi", "临沂"),
    ("zibo", "淄博"),
    ("weihai", "威海"),
    ("dongying", "东营"),
    ("binzhou", "滨州"),
    ("dezhou", "德州"),
    ("liaocheng", "聊城"),
    ("heze", "菏泽"),
    ("zaozhuang", "枣庄"),
    ("jining", "济宁"),
    ("taian", "泰安"),
    ("rizhao", "日照"),
    ("laiwu", "莱芜"),
    ("huaian", "淮安"),
    ("yancheng", "盐城"),
    ("yangzhou", "扬州"),
    ("zhenjiang", "镇江"),
    ("suqian", "宿迁"),
    ("lianyungang", "连云港"),
    ("shaoxing", "绍兴"),
    ("jiaxing", "嘉兴"),
    ("huzhou", "湖州"),
    ("lishui", "丽水"),
    ("quzhou", "衢州"),
    ("zhoushan", "舟山"),
    ("wenzhou", "温州"),
    ("kunming", "昆明"),
    ("km", "昆明"),
    ("lanzhou", "兰州"),
    ("lz", "兰州"),
    ("urumqi", "乌鲁木齐"),
    ("guiyang", "贵阳"),
    ("gy", "贵阳"),
    ("nanning", "南宁"),
    ("nn", "南宁"),
    ("haikou", "海口"),
    ("hk", "海口"),
    ("shijiazhuang", "石家庄"),
    ("sjz", "石家庄"),
    ("hohhot", "呼和浩特"),
];

/// Returns the Chinese city name for a locale code, or the code itself when
/// the code is not known.
#[must_use]
pub fn locale_display_name(code: &str) -> &str {
    LOCALE_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map_or(code, |(_, name)| *name)
}
